//! Common test utilities for CLI contract and scenario tests.
//!
//! This module provides:
//! - `TestEnv`: an isolated directory with a seeded registry state file
//! - Fixtures: a small registry with services, a rule and a deployment group
//! - Assertion macros: `assert_output_contains!`, `assert_exit_code!`

#![allow(dead_code)]

pub mod assertions;
pub mod env;
pub mod fixtures;

pub use env::*;
pub use fixtures::*;
