//! Reading types: raw form input, validated input, computed records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::TariffRates;

/// One dated snapshot of absolute meter values plus the consumption and
/// cost derived from its chronological predecessor.
///
/// Derived fields (`consumption`, `costs`, `total_cost`) are owned by the
/// calculator; everything else survives recalculation untouched. The
/// tariff snapshot is embedded so later edits to the tariff history never
/// rewrite historical costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: Uuid,
    pub date: NaiveDate,
    /// Absolute cumulative register values, keyed by schema quantity key
    pub values: BTreeMap<String, f64>,
    #[serde(default)]
    pub consumption: BTreeMap<String, f64>,
    #[serde(default)]
    pub costs: BTreeMap<String, f64>,
    #[serde(default)]
    pub total_cost: f64,
    pub tariff_snapshot: TariffRates,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Reading {
    /// Absolute register value; quantities the record never stored read as 0.
    pub fn value(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn consumption_for(&self, key: &str) -> f64 {
        self.consumption.get(key).copied().unwrap_or(0.0)
    }

    pub fn cost_for(&self, key: &str) -> f64 {
        self.costs.get(key).copied().unwrap_or(0.0)
    }

    /// Sum of all quantities' consumption (display only; unit-mixing is the
    /// schema author's concern).
    pub fn total_consumption(&self) -> f64 {
        self.consumption.values().sum()
    }
}

/// Validated numeric input for the calculator. Produced by the validation
/// pass; the calculator assumes every schema quantity is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingInput {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
    pub note: String,
}

impl ReadingInput {
    pub fn new(date: NaiveDate, values: BTreeMap<String, f64>, note: impl Into<String>) -> Self {
        Self {
            date,
            values,
            note: note.into(),
        }
    }

    pub fn value(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }
}

/// Raw form submission as the user typed it. Nothing here is trusted;
/// the validation pass turns it into a `ReadingInput` or a list of
/// field errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingForm {
    pub date: String,
    /// Quantity key → raw text
    pub values: BTreeMap<String, String>,
    pub note: String,
}

impl ReadingForm {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, raw: impl Into<String>) -> Self {
        self.values.insert(key.into(), raw.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Live estimate shown while the user types, before anything is saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPreview {
    pub consumption: BTreeMap<String, f64>,
    pub costs: BTreeMap<String, f64>,
    pub total_cost: f64,
}
