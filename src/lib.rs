//! Skinmaker: turns a photo into a custom champion skin.
//!
//! Two paths produce a skin:
//! - the generative-image API behind the [`ports::SkinGenerator`] port, and
//! - the local [`imaging`] pipeline (normalize, stylize, overlay).
//!
//! [`handler::Handler`] picks one, stores the result and describes it.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod imaging;
pub mod model;
pub mod output;
pub mod ports;
pub mod prompt;
