//! Read-only query surface for the REST/CLI layer.

pub mod query;

pub use query::{CheckpointQuery, QueryHandler, QueryResponse, QueryStatus};
