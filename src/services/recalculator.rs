//! Whole-sequence recalculation.
//!
//! Any mutation of the collection (insert, edit, delete, import) changes
//! some record's chronological predecessor, so derived fields are rebuilt
//! for the entire collection in one pass instead of patching neighbours.

use crate::types::schema::ResourceSchema;
use crate::types::{Reading, ReadingInput};

use super::calculator::compute_reading;

/// Re-derive consumption and cost for every record.
///
/// Sorts by date ascending and replays the calculator with the running
/// previous-computed accumulator. Each record keeps its own stored tariff
/// snapshot (editing the tariff history never rewrites past costs) and
/// its identity (`id`, `created_at`), note and raw values survive
/// untouched. Idempotent, and independent of the input order.
pub fn recalculate_all(schema: &ResourceSchema, readings: Vec<Reading>) -> Vec<Reading> {
    let mut sorted = readings;
    sorted.sort_by_key(|r| r.date);

    let mut result: Vec<Reading> = Vec::with_capacity(sorted.len());
    for r in sorted {
        let input = ReadingInput::new(r.date, r.values.clone(), r.note.clone());
        let mut recalculated = compute_reading(schema, &input, result.last(), &r.tariff_snapshot);
        recalculated.id = r.id;
        recalculated.created_at = r.created_at;
        result.push(recalculated);
    }
    result
}
