//! # MDW Common Library
//!
//! Shared code for the MDW measurement data warehouse:
//! - Error taxonomy
//! - Configuration loading and database path resolution
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
