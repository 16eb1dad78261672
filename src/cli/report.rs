//! Plain-text and JSON rendering for the CLI. Display only; every
//! number here was computed by the engine.

use crate::services::analytics::Bucket;
use crate::types::schema::ResourceSchema;
use crate::types::{Reading, ReadingPreview, TariffSettings};

/// Minimal column-aligned table printer.
fn print_table(headers: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", render(headers));
    for row in rows {
        println!("{}", render(row));
    }
}

fn fmt(value: f64, precision: u32) -> String {
    format!("{:.*}", precision as usize, value)
}

pub fn print_readings(schema: &ResourceSchema, readings: &[Reading]) {
    if readings.is_empty() {
        println!("No readings recorded yet.");
        return;
    }

    let mut headers = vec!["DATE".to_string()];
    for q in schema.quantities {
        headers.push(format!("{} ({})", q.label.to_uppercase(), q.unit));
        headers.push(format!("Δ{}", q.key.to_uppercase()));
        headers.push(format!("COST {}", q.key.to_uppercase()));
    }
    headers.push("TOTAL".to_string());
    headers.push("NOTE".to_string());
    headers.push("ID".to_string());

    let rows: Vec<Vec<String>> = readings
        .iter()
        .map(|r| {
            let mut row = vec![r.date.to_string()];
            for q in schema.quantities {
                row.push(fmt(r.value(q.key), q.precision));
                row.push(fmt(r.consumption_for(q.key), q.precision));
                row.push(fmt(r.cost_for(q.key), 2));
            }
            row.push(fmt(r.total_cost, 2));
            row.push(r.note.clone());
            row.push(r.id.to_string());
            row
        })
        .collect();

    print_table(&headers, &rows);
}

pub fn print_reading_summary(schema: &ResourceSchema, reading: &Reading) {
    for q in schema.quantities {
        println!(
            "  {}: {} {} (consumed {}, cost {})",
            q.label,
            fmt(reading.value(q.key), q.precision),
            q.unit,
            fmt(reading.consumption_for(q.key), q.precision),
            fmt(reading.cost_for(q.key), 2),
        );
    }
    println!("  Total cost: {}", fmt(reading.total_cost, 2));
}

pub fn print_buckets(schema: &ResourceSchema, buckets: &[Bucket]) {
    if buckets.is_empty() {
        println!("No readings in the selected period.");
        return;
    }

    let mut headers = vec!["PERIOD".to_string(), "LABEL".to_string()];
    for q in schema.quantities {
        headers.push(format!("Δ{} ({})", q.key.to_uppercase(), q.unit));
    }
    headers.push("COST".to_string());
    headers.push("AVG/DAY".to_string());
    headers.push("READINGS".to_string());

    let rows: Vec<Vec<String>> = buckets
        .iter()
        .map(|b| {
            let mut row = vec![b.period.clone(), b.label.clone()];
            for q in schema.quantities {
                row.push(fmt(
                    b.consumption.get(q.key).copied().unwrap_or(0.0),
                    q.precision,
                ));
            }
            row.push(fmt(b.total_cost, 2));
            row.push(fmt(b.avg_daily_cost, 2));
            row.push(b.days_count.to_string());
            row
        })
        .collect();

    print_table(&headers, &rows);
}

pub fn print_preview(schema: &ResourceSchema, preview: &ReadingPreview) {
    for q in schema.quantities {
        println!(
            "  {}: consumed {} {}, cost {}",
            q.label,
            fmt(
                preview.consumption.get(q.key).copied().unwrap_or(0.0),
                q.precision
            ),
            q.unit,
            fmt(preview.costs.get(q.key).copied().unwrap_or(0.0), 2),
        );
    }
    println!("  Total cost: {}", fmt(preview.total_cost, 2));
}

pub fn print_tariff(schema: &ResourceSchema, settings: &TariffSettings) {
    println!("Current rates:");
    for q in schema.quantities {
        println!(
            "  {}: {} per {}",
            q.label,
            settings.current.rate(q.key),
            q.unit
        );
    }

    if settings.history.is_empty() {
        println!("No tariff history recorded.");
        return;
    }

    println!("History:");
    let headers = std::iter::once("FROM".to_string())
        .chain(schema.quantities.iter().map(|q| q.key.to_uppercase()))
        .collect::<Vec<_>>();
    let rows: Vec<Vec<String>> = settings
        .history
        .iter()
        .map(|p| {
            std::iter::once(p.start_date.to_string())
                .chain(
                    schema
                        .quantities
                        .iter()
                        .map(|q| p.rates.rate(q.key).to_string()),
                )
                .collect()
        })
        .collect();
    print_table(&headers, &rows);
}
