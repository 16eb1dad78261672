//! meterlog: tariff-aware utility meter tracking.
//!
//! One generic engine (readings → consumption deltas → tariff-attributed
//! costs → analytics buckets) instantiated for electricity, water and
//! gas. The CLI, persistence and import/export layers are thin
//! collaborators; derived numbers only ever come out of the engine.

pub mod cli;
pub mod observability;
pub mod services;
pub mod types;
