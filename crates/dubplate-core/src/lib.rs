//! Core domain model for dubplate.
//!
//! This crate defines the data model for the bucket audit (bucket
//! entries, duplicate groups, release matches, validation reports),
//! the metadata-database track records with their two-phase removal
//! ledger, and the SQLite schema behind them.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
