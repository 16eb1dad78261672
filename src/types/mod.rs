//! Type definitions for meterlog

mod error;
mod reading;
pub mod schema;
mod tariff;

pub use error::*;
pub use reading::*;
pub use schema::{ResourceKind, ResourceSchema, COST_PRECISION};
pub use tariff::*;
