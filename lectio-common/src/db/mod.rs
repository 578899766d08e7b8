//! Database schema and persistence gateway
//!
//! Record-oriented operations over the relational schema. Every operation
//! takes a `&mut SqliteConnection` so callers can run a sequence of them on
//! one pooled connection or inside one transaction (`&mut *tx`).

pub mod init;
pub mod journals;
pub mod notes;
pub mod tags;
pub mod users;
pub mod verses;

pub use init::*;
