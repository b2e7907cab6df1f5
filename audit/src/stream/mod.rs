//! Event stream sources.

mod client;
mod decoder;
mod twitter;

pub use client::{EventStream, StreamClient};
pub use decoder::decode_event_stream;
pub use twitter::TwitterStreamClient;
