//! # Costing Engine
//!
//! Converts recipe measurements into inventory base units, prices them and
//! assigns date-sequenced SKUs.

pub mod cogs;
pub mod sku;
pub mod units;

use thiserror::Error;

use crate::database::StoreError;

pub use cogs::compute_cogs;
pub use sku::generate_sku;
pub use units::Unit;

#[derive(Debug, Error)]
pub enum CostingError {
    #[error("item {0} not found")]
    ItemNotFound(String),

    #[error("invalid unit: {0}")]
    InvalidUnit(String),

    #[error("item {0} has zero quantity")]
    ZeroQuantity(String),

    #[error("number_of_cups must be at least 1, got {0}")]
    InvalidUnitsProduced(i32),

    #[error("cost of {0} is out of range")]
    Overflow(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
