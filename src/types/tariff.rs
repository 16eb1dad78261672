//! Tariff rates and the append-only rate-change history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-quantity rates (currency per unit), keyed by schema quantity key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TariffRates {
    rates: BTreeMap<String, f64>,
}

impl TariffRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            rates: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, rate: f64) {
        self.rates.insert(key.into(), rate);
    }

    /// Rate for a quantity; unknown keys price at zero.
    pub fn rate(&self, key: &str) -> f64 {
        self.rates.get(key).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// One entry in the rate-change history: these rates apply from
/// `start_date` until a later period supersedes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffPeriod {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub rates: TariffRates,
}

/// Current rates plus the append-only history of rate changes.
///
/// `current` is the fallback for dates before any recorded period; it is
/// also kept in sync with the most recently appended period so new
/// readings pick it up without a history scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffSettings {
    pub current: TariffRates,
    #[serde(default)]
    pub history: Vec<TariffPeriod>,
}

impl TariffSettings {
    pub fn new(current: TariffRates) -> Self {
        Self {
            current,
            history: Vec::new(),
        }
    }

    /// Rates effective on `date`: the period with the latest
    /// `start_date <= date`. Ties on `start_date` resolve to the
    /// last-appended period. With no qualifying period, `current` applies.
    pub fn rates_for_date(&self, date: NaiveDate) -> TariffRates {
        self.history
            .iter()
            .filter(|p| p.start_date <= date)
            .max_by_key(|p| p.start_date)
            .map(|p| p.rates.clone())
            .unwrap_or_else(|| self.current.clone())
    }

    /// Record a rate change effective from `start_date` and make it the
    /// current tariff. History is never edited in place.
    pub fn append_period(&mut self, rates: TariffRates, start_date: NaiveDate) -> &TariffPeriod {
        self.current = rates.clone();
        self.history.push(TariffPeriod {
            id: Uuid::new_v4(),
            start_date,
            rates,
        });
        self.history.last().expect("period just pushed")
    }
}
