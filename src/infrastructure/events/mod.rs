//! Event Sink Implementations
//!
//! - JsonEventSink: NDJSON output for CI/automation
//!
//! The human-readable sink lives in `presentation::console`, next to the
//! rest of the terminal rendering.

mod json;

pub use json::{outcome_json, revision_json, JsonEventSink};
