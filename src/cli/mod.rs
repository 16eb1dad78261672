mod report;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::services::exchange::{document_to_json, export_document, import_into, parse_document};
use crate::services::persistence::StoreRepository;
use crate::services::validation::validate_form;
use crate::services::{aggregate, preview_reading, Granularity, MeterStore};
use crate::types::schema::ResourceSchema;
use crate::types::{MeterlogError, Reading, ReadingForm, ReadingInput, ResourceKind, TariffRates};

/// Tariff-aware utility meter tracker
#[derive(Parser)]
#[command(name = "meterlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ResourceArg {
    /// Resource to operate on: electricity, water or gas
    #[arg(long, short = 'r', value_parser = parse_resource)]
    resource: ResourceKind,
}

#[derive(Args, Debug)]
struct FormArgs {
    /// Reading date (yyyy-mm-dd)
    #[arg(long)]
    date: String,

    /// Absolute meter value as KEY=VALUE (e.g. t1=12345.6); a bare value
    /// works for single-register meters
    #[arg(long = "value", value_name = "KEY=VALUE")]
    values: Vec<String>,

    /// Free-form note stored with the reading
    #[arg(long)]
    note: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new meter reading
    Add {
        #[command(flatten)]
        target: ResourceArg,
        #[command(flatten)]
        form: FormArgs,
    },

    /// List readings with computed consumption and cost
    List {
        #[command(flatten)]
        target: ResourceArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate consumption and cost for typed values without saving
    Preview {
        #[command(flatten)]
        target: ResourceArg,
        /// Diff against the reading preceding this date (default: latest)
        #[arg(long)]
        date: Option<String>,
        /// Meter value as KEY=VALUE
        #[arg(long = "value", value_name = "KEY=VALUE")]
        values: Vec<String>,
    },

    /// Rewrite an existing reading; later readings are rebased
    Edit {
        #[command(flatten)]
        target: ResourceArg,
        /// Id of the reading to edit
        id: Uuid,
        #[command(flatten)]
        form: FormArgs,
    },

    /// Delete a reading; its successor rebases automatically
    Delete {
        #[command(flatten)]
        target: ResourceArg,
        /// Id of the reading to delete
        id: Uuid,
    },

    /// Show or change tariff rates
    Tariff {
        #[command(flatten)]
        target: ResourceArg,
        #[command(subcommand)]
        command: TariffCommands,
    },

    /// Aggregate consumption and cost per period
    Report {
        #[command(flatten)]
        target: ResourceArg,
        /// day, week, month, year or custom
        #[arg(long, default_value = "month", value_parser = parse_granularity)]
        period: Granularity,
        /// Start of the date range (inclusive)
        #[arg(long)]
        from: Option<String>,
        /// End of the date range (inclusive)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write all readings and tariff settings as a JSON document
    Export {
        #[command(flatten)]
        target: ResourceArg,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace the collection from an exported JSON document
    Import {
        #[command(flatten)]
        target: ResourceArg,
        /// Document to import
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum TariffCommands {
    /// Show current rates and history
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Append a rate-change period and make it current
    Set {
        /// Rate as KEY=VALUE (e.g. t1=3.94); one per register
        #[arg(long = "rate", value_name = "KEY=VALUE", required = true)]
        rates: Vec<String>,
        /// Date the rates take effect (default: today)
        #[arg(long)]
        from: Option<String>,
    },
}

fn parse_resource(s: &str) -> std::result::Result<ResourceKind, String> {
    ResourceKind::from_str(s)
}

fn parse_granularity(s: &str) -> std::result::Result<Granularity, String> {
    Granularity::from_str(s)
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let repo = StoreRepository::new()?;
        self.run_with(&repo)
    }

    /// Entry point with an injectable repository (tests use a temp dir).
    pub fn run_with(self, repo: &StoreRepository) -> anyhow::Result<()> {
        match self.command {
            Commands::Add { target, form } => cmd_add(repo, target.resource, form),
            Commands::List { target, json } => cmd_list(repo, target.resource, json),
            Commands::Preview {
                target,
                date,
                values,
            } => cmd_preview(repo, target.resource, date, &values),
            Commands::Edit { target, id, form } => cmd_edit(repo, target.resource, id, form),
            Commands::Delete { target, id } => cmd_delete(repo, target.resource, id),
            Commands::Tariff { target, command } => cmd_tariff(repo, target.resource, command),
            Commands::Report {
                target,
                period,
                from,
                to,
                json,
            } => cmd_report(repo, target.resource, period, from, to, json),
            Commands::Export { target, output } => cmd_export(repo, target.resource, output),
            Commands::Import { target, input } => cmd_import(repo, target.resource, &input),
        }
    }
}

fn cmd_add(repo: &StoreRepository, kind: ResourceKind, form: FormArgs) -> anyhow::Result<()> {
    let mut store = repo.load(kind)?;
    let input = validated_input(&store, &form, None)?;
    let reading = store.add_reading(input)?;
    repo.save(&store)?;

    println!("Recorded {} reading for {}:", kind, reading.date);
    report::print_reading_summary(store.schema(), &reading);
    Ok(())
}

fn cmd_list(repo: &StoreRepository, kind: ResourceKind, json: bool) -> anyhow::Result<()> {
    let store = repo.load(kind)?;
    if json {
        println!("{}", serde_json::to_string_pretty(store.readings())?);
    } else {
        report::print_readings(store.schema(), store.readings());
    }
    Ok(())
}

fn cmd_preview(
    repo: &StoreRepository,
    kind: ResourceKind,
    date: Option<String>,
    values: &[String],
) -> anyhow::Result<()> {
    let store = repo.load(kind)?;
    let raw = parse_value_map(store.schema(), values)?;

    let (prev, rates) = match date {
        Some(raw_date) => {
            let date = parse_date(&raw_date)?;
            (
                store.prev_reading_for(date),
                store.tariff().rates_for_date(date),
            )
        }
        None => (store.last_reading(), store.tariff().current.clone()),
    };

    match preview_reading(store.schema(), &raw, prev, &rates) {
        Some(preview) => report::print_preview(store.schema(), &preview),
        None => println!("No previous reading to compare against yet."),
    }
    Ok(())
}

fn cmd_edit(
    repo: &StoreRepository,
    kind: ResourceKind,
    id: Uuid,
    form: FormArgs,
) -> anyhow::Result<()> {
    let mut store = repo.load(kind)?;
    let input = validated_input(&store, &form, Some(id))?;
    let reading = store.update_reading(id, input)?;
    repo.save(&store)?;

    println!("Updated {} reading for {}:", kind, reading.date);
    report::print_reading_summary(store.schema(), &reading);
    Ok(())
}

fn cmd_delete(repo: &StoreRepository, kind: ResourceKind, id: Uuid) -> anyhow::Result<()> {
    let mut store = repo.load(kind)?;
    store.delete_reading(id)?;
    repo.save(&store)?;
    println!("Deleted reading {}; later readings rebased.", id);
    Ok(())
}

fn cmd_tariff(
    repo: &StoreRepository,
    kind: ResourceKind,
    command: TariffCommands,
) -> anyhow::Result<()> {
    match command {
        TariffCommands::Show { json } => {
            let store = repo.load(kind)?;
            if json {
                println!("{}", serde_json::to_string_pretty(store.tariff())?);
            } else {
                report::print_tariff(store.schema(), store.tariff());
            }
            Ok(())
        }
        TariffCommands::Set { rates, from } => {
            let mut store = repo.load(kind)?;
            let rates = parse_rates(store.schema(), &rates)?;
            let start_date = match from {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let period = store.set_tariff(rates, start_date);
            println!("Rates effective from {}.", period.start_date);
            repo.save(&store)?;
            Ok(())
        }
    }
}

fn cmd_report(
    repo: &StoreRepository,
    kind: ResourceKind,
    period: Granularity,
    from: Option<String>,
    to: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let store = repo.load(kind)?;

    let range = match (from, to) {
        (Some(from), Some(to)) => Some((parse_date(&from)?, parse_date(&to)?)),
        (None, None) => None,
        _ => bail!("--from and --to must be given together"),
    };
    if period == Granularity::Custom && range.is_none() {
        bail!("custom period requires --from and --to");
    }

    let buckets = aggregate(store.schema(), store.readings(), period, range);
    if json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
    } else {
        report::print_buckets(store.schema(), &buckets);
    }
    Ok(())
}

fn cmd_export(
    repo: &StoreRepository,
    kind: ResourceKind,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = repo.load(kind)?;
    let json = document_to_json(&export_document(&store))?;
    match output {
        Some(path) => {
            std::fs::write(&path, &json)?;
            println!("Exported {} readings to {}.", store.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import(repo: &StoreRepository, kind: ResourceKind, input: &PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(input)?;
    let doc = parse_document(&content)?;

    let mut store = repo.load(kind)?;
    import_into(&mut store, doc);
    repo.save(&store)?;
    println!("Imported {} readings.", store.len());
    Ok(())
}

/// Build and validate a `ReadingInput` from CLI form arguments.
fn validated_input(
    store: &MeterStore,
    form: &FormArgs,
    editing: Option<Uuid>,
) -> anyhow::Result<ReadingInput> {
    let schema = store.schema();
    let reading_form = ReadingForm {
        date: form.date.clone(),
        values: parse_value_map(schema, &form.values)?,
        note: form.note.clone().unwrap_or_default(),
    };

    // predecessor of the submitted date, ignoring the record being edited
    let prev: Option<&Reading> = NaiveDate::parse_from_str(reading_form.date.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| {
            store
                .readings()
                .iter()
                .filter(|r| r.date < d && Some(r.id) != editing)
                .next_back()
        });

    validate_form(schema, &reading_form, prev, store.readings(), editing)
        .map_err(MeterlogError::from)
        .map_err(Into::into)
}

/// Parse repeated KEY=VALUE arguments into a raw form map. A bare value
/// is accepted when the schema has a single register.
fn parse_value_map(
    schema: &ResourceSchema,
    pairs: &[String],
) -> anyhow::Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for raw in pairs {
        let (key, value) = match raw.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
            None if schema.quantities.len() == 1 => (
                schema.quantities[0].key.to_string(),
                raw.trim().to_string(),
            ),
            None => bail!("expected KEY=VALUE, got '{}'", raw),
        };
        if schema.quantity(&key).is_none() {
            let known: Vec<&str> = schema.keys().collect();
            bail!(
                "unknown quantity '{}' for {} (expected: {})",
                key,
                schema.kind,
                known.join(", ")
            );
        }
        map.insert(key, value);
    }
    Ok(map)
}

/// Parse repeated KEY=VALUE rate arguments; every register must be set.
fn parse_rates(schema: &ResourceSchema, pairs: &[String]) -> anyhow::Result<TariffRates> {
    let raw = parse_value_map(schema, pairs)?;
    let mut rates = TariffRates::new();
    for q in schema.quantities {
        let value = match raw.get(q.key) {
            Some(v) => v,
            None => bail!("missing rate for '{}'", q.key),
        };
        let parsed: f64 = value
            .parse()
            .map_err(|_| anyhow::anyhow!("rate for '{}' must be a number, got '{}'", q.key, value))?;
        if !parsed.is_finite() || parsed < 0.0 {
            bail!("rate for '{}' must be a non-negative number", q.key);
        }
        rates.set(q.key, parsed);
    }
    Ok(rates)
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("date must be yyyy-mm-dd, got '{}'", raw))
}
