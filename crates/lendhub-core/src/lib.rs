//! # lendhub-core
//!
//! Core crate for the LendHub notification engine. Contains the unified
//! error system, configuration schemas, typed identifiers, and the
//! pagination window.
//!
//! This crate has **no** internal dependencies on other LendHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
