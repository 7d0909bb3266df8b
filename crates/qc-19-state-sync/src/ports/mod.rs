//! Hexagonal architecture ports.

pub mod inbound;
pub mod outbound;

pub use inbound::StateSyncApi;
pub use outbound::{EventRecordFetcher, PageSink, UpstreamPage};
