//! Reading calculator: derives consumption and cost for one reading.
//!
//! Consumption for each register is the delta against the chronological
//! predecessor, clamped at zero (a meter swap or typo must never produce
//! negative consumption). The first reading of a collection has zero
//! consumption for every register. The supplied tariff is embedded into
//! the result verbatim as the snapshot future recalculations will use.

use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::schema::{round_to, ResourceSchema};
use crate::types::{Reading, ReadingInput, ReadingPreview, TariffRates, COST_PRECISION};

/// Compute a full reading record from validated input.
///
/// Assigns a fresh id and creation timestamp; the recalculator overwrites
/// both when replaying an existing record. Total for any numeric input;
/// validation has already rejected malformed forms.
pub fn compute_reading(
    schema: &ResourceSchema,
    input: &ReadingInput,
    prev: Option<&Reading>,
    rates: &TariffRates,
) -> Reading {
    let mut consumption = BTreeMap::new();
    let mut costs = BTreeMap::new();
    let mut total_cost = 0.0;

    for q in schema.quantities {
        let delta = match prev {
            Some(p) => round_to((input.value(q.key) - p.value(q.key)).max(0.0), q.precision),
            None => 0.0,
        };
        let cost = round_to(delta * rates.rate(q.key), COST_PRECISION);
        total_cost += cost;
        consumption.insert(q.key.to_string(), delta);
        costs.insert(q.key.to_string(), cost);
    }

    Reading {
        id: Uuid::new_v4(),
        date: input.date,
        values: input.values.clone(),
        consumption,
        costs,
        total_cost: round_to(total_cost, COST_PRECISION),
        tariff_snapshot: rates.clone(),
        note: input.note.clone(),
        created_at: Utc::now(),
    }
}

/// Live estimate for raw form text, before validation or commit.
///
/// Returns `None` when there is no previous reading to diff against (a
/// first reading has no defined consumption yet). Unparseable text is
/// treated as 0 so the estimate updates smoothly while the user types.
pub fn preview_reading(
    schema: &ResourceSchema,
    raw_values: &BTreeMap<String, String>,
    prev: Option<&Reading>,
    rates: &TariffRates,
) -> Option<ReadingPreview> {
    let prev = prev?;

    let mut consumption = BTreeMap::new();
    let mut costs = BTreeMap::new();
    let mut total_cost = 0.0;

    for q in schema.quantities {
        let typed = raw_values
            .get(q.key)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        let delta = round_to((typed - prev.value(q.key)).max(0.0), q.precision);
        let cost = round_to(delta * rates.rate(q.key), COST_PRECISION);
        total_cost += cost;
        consumption.insert(q.key.to_string(), delta);
        costs.insert(q.key.to_string(), cost);
    }

    Some(ReadingPreview {
        consumption,
        costs,
        total_cost: round_to(total_cost, COST_PRECISION),
    })
}
