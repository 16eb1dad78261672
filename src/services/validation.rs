//! Form validation: everything that must be rejected before the
//! calculator runs (the calculator itself is total).

use chrono::NaiveDate;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::schema::ResourceSchema;
use crate::types::{Reading, ReadingForm, ReadingInput, ValidationErrors};

/// Validate a raw form against the schema and the existing collection.
///
/// `prev` is the chronological predecessor of the submitted date;
/// `editing` exempts the record being edited from the duplicate-date
/// check. On success, returns the parsed input the calculator consumes.
pub fn validate_form(
    schema: &ResourceSchema,
    form: &ReadingForm,
    prev: Option<&Reading>,
    existing: &[Reading],
    editing: Option<Uuid>,
) -> std::result::Result<ReadingInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let date = parse_date(form, existing, editing, &mut errors);

    let mut values = BTreeMap::new();
    for q in schema.quantities {
        let raw = form.values.get(q.key).map(|s| s.trim()).unwrap_or("");
        if raw.is_empty() {
            errors.push(q.key, format!("{} reading is required", q.label));
            continue;
        }
        let parsed = match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                errors.push(q.key, "value must be a number");
                continue;
            }
        };
        if parsed < 0.0 {
            errors.push(q.key, "value cannot be negative");
            continue;
        }
        if let Some(p) = prev {
            let floor = p.value(q.key);
            if parsed < floor {
                errors.push(
                    q.key,
                    format!("cannot be less than the previous reading ({})", floor),
                );
                continue;
            }
        }
        values.insert(q.key.to_string(), parsed);
    }

    match (date, errors.is_empty()) {
        (Some(date), true) => Ok(ReadingInput::new(date, values, form.note.clone())),
        _ => Err(errors),
    }
}

fn parse_date(
    form: &ReadingForm,
    existing: &[Reading],
    editing: Option<Uuid>,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let raw = form.date.trim();
    if raw.is_empty() {
        errors.push("date", "date is required");
        return None;
    }
    let date = match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            errors.push("date", "date must be yyyy-mm-dd");
            return None;
        }
    };
    let duplicate = existing
        .iter()
        .any(|r| r.date == date && editing != Some(r.id));
    if duplicate {
        errors.push("date", "a reading for this date already exists");
    }
    Some(date)
}
