//! Schema unification
//!
//! # Overview
//!
//! The schema module provides:
//! - `TableSchema` - ordered, unique column names (first-seen order)
//! - `TableBatch` - a schema plus rows padded to it
//! - `SchemaUnifier` - batch of heterogeneous flat records → uniform rows

mod types;
mod unifier;

pub use types::{TableBatch, TableSchema};
pub use unifier::{unify_records, SchemaUnifier};
