//! Property tests for ecs-rollout.
//!
//! Properties use randomized input generation to explore edge cases and
//! protect invariants like "never panics" and "merges preserve what they
//! were not asked to change".
//!
//! Run with: `cargo test --test properties`

#[path = "properties/merge.rs"]
mod merge;

#[path = "properties/references.rs"]
mod references;
