//! Read-only aggregation of computed readings into period buckets.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::schema::{round_to, ResourceSchema};
use crate::types::{Reading, COST_PRECISION};

/// Aggregation window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per reading
    Day,
    /// ISO week, Monday start, keyed by the week's first day
    Week,
    /// Calendar month (`yyyy-mm`)
    Month,
    /// Calendar year (`yyyy`)
    Year,
    /// Explicit date range, bucketed per day
    Custom,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            "custom" => Ok(Granularity::Custom),
            other => Err(format!(
                "unknown period '{}' (expected day, week, month, year or custom)",
                other
            )),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
            Granularity::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// One aggregation window with summed consumption and cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Sort key: the date, week start, `yyyy-mm` or `yyyy`
    pub period: String,
    /// Human-readable period name
    pub label: String,
    /// Per-quantity consumption, rounded to each quantity's precision
    pub consumption: BTreeMap<String, f64>,
    pub total_consumption: f64,
    /// Per-quantity cost
    pub costs: BTreeMap<String, f64>,
    pub total_cost: f64,
    pub avg_daily_cost: f64,
    /// Number of readings in this bucket
    pub days_count: u32,
}

/// Group readings into buckets and sum their consumption/cost.
///
/// The optional range filter keeps readings with `from <= date <= to`
/// before grouping, so buckets never appear with zero readings. Output is
/// sorted ascending by period key. Input is untouched: the display layer
/// gets projections, never recomputed numbers.
pub fn aggregate(
    schema: &ResourceSchema,
    readings: &[Reading],
    granularity: Granularity,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Vec<Bucket> {
    let mut groups: BTreeMap<String, Vec<&Reading>> = BTreeMap::new();
    for r in readings {
        if let Some((from, to)) = range {
            if r.date < from || r.date > to {
                continue;
            }
        }
        groups
            .entry(period_key(granularity, r.date))
            .or_default()
            .push(r);
    }

    groups
        .into_iter()
        .map(|(period, items)| build_bucket(schema, granularity, period, &items))
        .collect()
}

fn period_key(granularity: Granularity, date: NaiveDate) -> String {
    match granularity {
        Granularity::Day | Granularity::Custom => date.to_string(),
        Granularity::Week => date.week(Weekday::Mon).first_day().to_string(),
        Granularity::Month => date.format("%Y-%m").to_string(),
        Granularity::Year => date.format("%Y").to_string(),
    }
}

fn period_label(granularity: Granularity, date: NaiveDate) -> String {
    match granularity {
        Granularity::Day | Granularity::Custom => date.format("%-d %b %Y").to_string(),
        Granularity::Week => {
            let iso = date.iso_week();
            format!("W{:02} {}", iso.week(), iso.year())
        }
        Granularity::Month => date.format("%B %Y").to_string(),
        Granularity::Year => date.format("%Y").to_string(),
    }
}

fn build_bucket(
    schema: &ResourceSchema,
    granularity: Granularity,
    period: String,
    items: &[&Reading],
) -> Bucket {
    let mut consumption = BTreeMap::new();
    let mut costs = BTreeMap::new();
    let mut total_consumption = 0.0;
    let mut total_cost = 0.0;

    for q in schema.quantities {
        let c: f64 = items.iter().map(|r| r.consumption_for(q.key)).sum();
        let cost: f64 = items.iter().map(|r| r.cost_for(q.key)).sum();
        total_consumption += c;
        total_cost += cost;
        consumption.insert(q.key.to_string(), round_to(c, q.precision));
        costs.insert(q.key.to_string(), round_to(cost, COST_PRECISION));
    }

    let days_count = items.len() as u32;
    let total_cost = round_to(total_cost, COST_PRECISION);
    let label = period_label(granularity, items[0].date);

    Bucket {
        period,
        label,
        consumption,
        total_consumption: round_to(total_consumption, schema.max_precision()),
        costs,
        total_cost,
        avg_daily_cost: round_to(total_cost / f64::from(days_count), COST_PRECISION),
        days_count,
    }
}
