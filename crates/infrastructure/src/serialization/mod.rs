//! Deterministic JSON for files written by the client and for console output.

mod json;

pub use json::*;
