//! Recording adapters: delegate to a real adapter and log each call.

pub mod skin_generator;
