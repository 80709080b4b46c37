//! Replaying adapters: answer from a cassette without touching the network.

pub mod skin_generator;
