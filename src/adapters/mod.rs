//! Adapter implementations for port traits.
//!
//! - `live/`: real API implementations
//! - `recording/`: delegate to a live adapter and write a cassette
//! - `replaying/`: answer from a cassette, no network

pub mod live;
pub mod recording;
pub mod replaying;
