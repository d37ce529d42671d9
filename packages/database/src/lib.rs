#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Population lookup stores for popbuilder.
//!
//! Two pre-built `SQLite` stores back the application, each holding a
//! `population` table keyed by zone code:
//!
//! - the summary store (`popzones-10.db`) with 10-year bands per sex, used
//!   by the results view;
//! - the detail store (`popzones-5.db`) with 5-year bands for persons,
//!   males, and females, used by the CSV download.
//!
//! Both are opened once at startup via [`db::PopulationStores`] and queried
//! read-only through `switchy_database`. The [`load`] module builds the
//! stores offline from a CSV extract.

pub mod db;
pub mod detail;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod in_clause;
pub mod load;
pub mod paths;
pub mod summary;

/// Name of the population table in both stores.
pub const POPULATION_TABLE: &str = "population";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// A store could not be opened.
    #[error("Failed to open store {path}: {message}")]
    Open {
        /// Path of the store file.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// A query was requested for an empty set of zone codes.
    #[error("No zone codes given")]
    NoZones,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
