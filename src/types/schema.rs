//! Resource schemas: which quantities a meter tracks and how they round.
//!
//! Electricity, water and gas share one engine; the schema is the only
//! thing that differs between them (quantity keys, units, rounding
//! precision). Consumption rounds to 2 decimals for energy and 3 for
//! volumetric registers; costs always round to 2.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places used for all monetary values.
pub const COST_PRECISION: u32 = 2;

/// One tracked register of a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantitySpec {
    /// Stable key used in reading/tariff maps (e.g. "t1", "cold", "gas")
    pub key: &'static str,
    /// Human-readable label for display
    pub label: &'static str,
    pub unit: &'static str,
    /// Decimal places for consumption values
    pub precision: u32,
}

/// Static description of one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSchema {
    pub kind: ResourceKind,
    pub quantities: &'static [QuantitySpec],
}

impl ResourceSchema {
    pub fn quantity(&self, key: &str) -> Option<&QuantitySpec> {
        self.quantities.iter().find(|q| q.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.quantities.iter().map(|q| q.key)
    }

    /// Precision for summed consumption across quantities.
    pub fn max_precision(&self) -> u32 {
        self.quantities.iter().map(|q| q.precision).max().unwrap_or(0)
    }
}

/// Dual-tariff electricity meter (day/night registers, kWh).
pub static ELECTRICITY: ResourceSchema = ResourceSchema {
    kind: ResourceKind::Electricity,
    quantities: &[
        QuantitySpec {
            key: "t1",
            label: "T1 (day)",
            unit: "kWh",
            precision: 2,
        },
        QuantitySpec {
            key: "t2",
            label: "T2 (night)",
            unit: "kWh",
            precision: 2,
        },
    ],
};

/// Cold/hot water meters (cubic meters).
pub static WATER: ResourceSchema = ResourceSchema {
    kind: ResourceKind::Water,
    quantities: &[
        QuantitySpec {
            key: "cold",
            label: "Cold",
            unit: "m3",
            precision: 3,
        },
        QuantitySpec {
            key: "hot",
            label: "Hot",
            unit: "m3",
            precision: 3,
        },
    ],
};

/// Single-register gas meter (cubic meters).
pub static GAS: ResourceSchema = ResourceSchema {
    kind: ResourceKind::Gas,
    quantities: &[QuantitySpec {
        key: "gas",
        label: "Gas",
        unit: "m3",
        precision: 3,
    }],
};

/// The three supported resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Electricity,
    Water,
    Gas,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Electricity,
        ResourceKind::Water,
        ResourceKind::Gas,
    ];

    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            ResourceKind::Electricity => &ELECTRICITY,
            ResourceKind::Water => &WATER,
            ResourceKind::Gas => &GAS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Electricity => "electricity",
            ResourceKind::Water => "water",
            ResourceKind::Gas => "gas",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "electricity" | "electric" => Ok(ResourceKind::Electricity),
            "water" => Ok(ResourceKind::Water),
            "gas" => Ok(ResourceKind::Gas),
            other => Err(format!(
                "unknown resource '{}' (expected electricity, water or gas)",
                other
            )),
        }
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
