//! Validation, query translation and bulk aggregation. No I/O happens here.

pub mod bulk;
pub mod query;
pub mod schema;
