//! Export/import of a resource's full state as a JSON document.
//!
//! The document shape matches what the original web app produced, so old
//! backups remain importable:
//! `{version, app, exportedAt, readings: [...], settings: {currentTariff,
//! tariffHistory}}`. Import never trusts embedded derived fields; the
//! whole collection goes back through the recalculator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{MeterlogError, Reading, Result, TariffPeriod, TariffRates, TariffSettings};

use super::store::MeterStore;

pub const EXPORT_VERSION: u32 = 1;
pub const EXPORT_APP: &str = "meterlog";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub current_tariff: TariffRates,
    #[serde(default)]
    pub tariff_history: Vec<TariffPeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    pub readings: Vec<Reading>,
    /// Absent in hand-trimmed documents; import then keeps the store's
    /// existing tariff settings
    #[serde(default)]
    pub settings: Option<ExportSettings>,
}

pub fn export_document(store: &MeterStore) -> ExportDocument {
    ExportDocument {
        version: EXPORT_VERSION,
        app: EXPORT_APP.to_string(),
        exported_at: Some(Utc::now()),
        readings: store.readings().to_vec(),
        settings: Some(ExportSettings {
            current_tariff: store.tariff().current.clone(),
            tariff_history: store.tariff().history.clone(),
        }),
    }
}

pub fn document_to_json(doc: &ExportDocument) -> Result<String> {
    serde_json::to_string_pretty(doc)
        .map_err(|e| MeterlogError::Import(format!("serialization failed: {}", e)))
}

/// Parse an export document, rejecting anything without a `readings`
/// array before any state is touched.
pub fn parse_document(json: &str) -> Result<ExportDocument> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| MeterlogError::Import(format!("invalid JSON: {}", e)))?;

    match value.get("readings") {
        Some(serde_json::Value::Array(_)) => {}
        _ => {
            return Err(MeterlogError::Import(
                "document has no readings array".into(),
            ))
        }
    }

    serde_json::from_value(value)
        .map_err(|e| MeterlogError::Import(format!("malformed document: {}", e)))
}

/// Replace the store's state with the document's, re-deriving every
/// reading. Tariff settings are taken from the document when present.
pub fn import_into(store: &mut MeterStore, doc: ExportDocument) {
    if let Some(settings) = doc.settings {
        store.set_tariff_settings(TariffSettings {
            current: settings.current_tariff,
            history: settings.tariff_history,
        });
    }
    let count = doc.readings.len();
    store.replace_readings(doc.readings);
    info!(resource = %store.kind(), count, "import complete");
}
