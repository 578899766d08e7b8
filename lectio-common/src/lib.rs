//! # Lectio Common Library
//!
//! Shared code for the Lectio server and client including:
//! - Record models (verses, notes, journals, tags, users)
//! - Wire types for the synchronization endpoints
//! - Bootstrap configuration loading
//! - Database schema and persistence gateway (feature `sqlx`)

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, FieldError, Result};
