//! Domain Layer
//!
//! The rollout rules without I/O dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Task definitions, override sets, service snapshots, outcomes
//! - `value_objects/` - Parsed inputs (TaskRef, ImageRef, ParsedCommand, WaitTimeout)
//! - `services/` - Revision merge and diff, event policy, deployment monitor
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - Network and disk access goes through `ports`
//! 2. **Pure merges** - Snapshots are never mutated; merges build new values
//! 3. **Virtual time** - The monitor only sees time through the `Clock` port

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
