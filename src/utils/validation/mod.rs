//! Consolidated validation utilities
//!
//! Centralized checks for request parameters, numeric conversions and
//! file paths, shared by the processor and the CLI.

pub mod config;
pub mod numeric;
pub mod path;

pub use config::ConfigValidator;
pub use numeric::NumericValidator;
pub use path::PathValidator;
