//! Typed record model and flattening
//!
//! # Overview
//!
//! The record module provides:
//! - `TypedValue` - tagged-union representation of a source field
//! - `FlatRecord` / `ScalarValue` - the flattened form of one record
//! - `RecordFlattener` - nested record → flat column/scalar mapping
//! - `decode_record` - attribute-encoded JSON wire form → `TypedValue`

mod decode;
mod flatten;
mod types;

pub use decode::{decode_record, decode_value};
pub use flatten::RecordFlattener;
pub use types::{FlatRecord, ScalarValue, TypedValue};
