//! JSON file persistence: one store file per resource under the user's
//! home directory.
//!
//! Files are read under a shared advisory lock and written under an
//! exclusive one so concurrent CLI invocations cannot interleave writes.
//! A missing file loads as an empty store; a corrupt one is an error and
//! leaves the file alone.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::types::{MeterlogError, Reading, ResourceKind, Result, TariffSettings};

use super::store::MeterStore;

pub const STORE_VERSION: u32 = 1;

/// On-disk envelope for one resource's state.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFile {
    pub version: u32,
    pub resource: ResourceKind,
    #[serde(default)]
    pub tariff: TariffSettings,
    #[serde(default)]
    pub readings: Vec<Reading>,
}

pub struct StoreRepository {
    data_dir: PathBuf,
}

impl StoreRepository {
    /// Repository rooted at `~/.meterlog`.
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| MeterlogError::Store("cannot determine home directory".into()))?;
        let data_dir = base_dirs.home_dir().join(".meterlog");
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Repository rooted at a custom directory (tests).
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn store_path(&self, kind: ResourceKind) -> PathBuf {
        self.data_dir.join(format!("{}.json", kind.as_str()))
    }

    pub fn load(&self, kind: ResourceKind) -> Result<MeterStore> {
        let path = self.store_path(kind);
        if !path.exists() {
            debug!(resource = %kind, "no store file yet, starting empty");
            return Ok(MeterStore::new(kind));
        }

        let file = File::open(&path)?;
        fs2::FileExt::lock_shared(&file)?;
        let mut content = String::new();
        let read_result = std::io::BufReader::new(&file).read_to_string(&mut content);
        let _ = fs2::FileExt::unlock(&file);
        read_result?;

        let parsed: StoreFile = serde_json::from_str(&content).map_err(|e| {
            MeterlogError::Store(format!("invalid store file {}: {}", path.display(), e))
        })?;
        if parsed.version != STORE_VERSION {
            return Err(MeterlogError::Store(format!(
                "unsupported store version {} in {}",
                parsed.version,
                path.display()
            )));
        }

        debug!(resource = %kind, readings = parsed.readings.len(), "store loaded");
        Ok(MeterStore::from_parts(kind, parsed.readings, parsed.tariff))
    }

    pub fn save(&self, store: &MeterStore) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.store_path(store.kind());

        let doc = StoreFile {
            version: STORE_VERSION,
            resource: store.kind(),
            tariff: store.tariff().clone(),
            readings: store.readings().to_vec(),
        };
        let content = serde_json::to_string_pretty(&doc)
            .map_err(|e| MeterlogError::Store(format!("serialization failed: {}", e)))?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        fs2::FileExt::lock_exclusive(&file)?;
        let write_result = (&file).write_all(content.as_bytes());
        let _ = fs2::FileExt::unlock(&file);
        write_result?;

        debug!(resource = %store.kind(), readings = store.len(), "store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReadingInput, TariffRates};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gas_input(d: NaiveDate, raw: f64) -> ReadingInput {
        ReadingInput::new(d, BTreeMap::from([("gas".to_string(), raw)]), "")
    }

    #[test]
    fn test_missing_file_loads_empty_store() {
        let temp = TempDir::new().unwrap();
        let repo = StoreRepository::with_data_dir(temp.path().to_path_buf());
        let store = repo.load(ResourceKind::Gas).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.kind(), ResourceKind::Gas);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let repo = StoreRepository::with_data_dir(temp.path().to_path_buf());

        let mut store = MeterStore::new(ResourceKind::Gas);
        store.set_tariff(TariffRates::from_pairs([("gas", 6.43)]), date(2024, 1, 1));
        store.add_reading(gas_input(date(2024, 1, 1), 100.0)).unwrap();
        store.add_reading(gas_input(date(2024, 2, 1), 120.0)).unwrap();
        repo.save(&store).unwrap();

        let loaded = repo.load(ResourceKind::Gas).unwrap();
        assert_eq!(loaded.readings(), store.readings());
        assert_eq!(loaded.tariff(), store.tariff());
    }

    #[test]
    fn test_resources_persist_independently() {
        let temp = TempDir::new().unwrap();
        let repo = StoreRepository::with_data_dir(temp.path().to_path_buf());

        let mut gas = MeterStore::new(ResourceKind::Gas);
        gas.set_tariff(TariffRates::from_pairs([("gas", 5.0)]), date(2024, 1, 1));
        gas.add_reading(gas_input(date(2024, 1, 1), 1.0)).unwrap();
        repo.save(&gas).unwrap();

        let water = repo.load(ResourceKind::Water).unwrap();
        assert!(water.is_empty());
        assert!(repo.store_path(ResourceKind::Gas).exists());
        assert!(!repo.store_path(ResourceKind::Water).exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let repo = StoreRepository::with_data_dir(temp.path().to_path_buf());
        fs::write(repo.store_path(ResourceKind::Gas), "not json{{{").unwrap();

        let err = repo.load(ResourceKind::Gas);
        assert!(matches!(err, Err(MeterlogError::Store(_))));
    }

    #[test]
    fn test_version_mismatch_is_an_error() {
        let temp = TempDir::new().unwrap();
        let repo = StoreRepository::with_data_dir(temp.path().to_path_buf());
        fs::write(
            repo.store_path(ResourceKind::Gas),
            r#"{"version": 99, "resource": "gas", "tariff": {"current": {}, "history": []}, "readings": []}"#,
        )
        .unwrap();

        let err = repo.load(ResourceKind::Gas);
        assert!(matches!(err, Err(MeterlogError::Store(msg)) if msg.contains("version")));
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let temp = TempDir::new().unwrap();
        let repo = StoreRepository::with_data_dir(temp.path().to_path_buf());

        let mut store = MeterStore::new(ResourceKind::Gas);
        store.set_tariff(TariffRates::from_pairs([("gas", 5.0)]), date(2024, 1, 1));
        store.add_reading(gas_input(date(2024, 1, 1), 1.0)).unwrap();
        repo.save(&store).unwrap();

        store.add_reading(gas_input(date(2024, 2, 1), 2.0)).unwrap();
        repo.save(&store).unwrap();

        let loaded = repo.load(ResourceKind::Gas).unwrap();
        assert_eq!(loaded.len(), 2);
    }
}
