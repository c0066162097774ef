//! perpcalc - leverage, margin and PnL calculator for perpetual futures trades

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result, ValidationError};
pub use services::{compute, Calculator};
pub use types::*;
