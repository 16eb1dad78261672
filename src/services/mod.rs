//! Engine services: calculation, recalculation, analytics, validation,
//! storage and exchange.

pub mod analytics;
pub mod calculator;
pub mod exchange;
pub mod persistence;
pub mod recalculator;
pub mod store;
pub mod validation;

pub use analytics::{aggregate, Bucket, Granularity};
pub use calculator::{compute_reading, preview_reading};
pub use persistence::StoreRepository;
pub use recalculator::recalculate_all;
pub use store::MeterStore;
pub use validation::validate_form;
