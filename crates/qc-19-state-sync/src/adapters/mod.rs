//! Adapters for the outbound ports.

pub mod channel_sink;
pub mod http_fetcher;

pub use channel_sink::ChannelPageSink;
pub use http_fetcher::HttpEventRecordFetcher;
