//! Deploy Module
//!
//! Rolls a service onto a new revision built from its current one.
//!
//! ## Structure
//!
//! - `options` - What to deploy (`DeployOptions`)
//! - `result` - What happened (`DeployResult`)
//! - `use_case` - The flow itself (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use ecs_rollout::application::deploy::{DeployOptions, DeployUseCase};
//!
//! let use_case = DeployUseCase::new(&ctx);
//! let result = use_case.execute(&DeployOptions::new("prod", "web"), &overrides)?;
//! ```

mod options;
mod result;
mod use_case;

pub use options::DeployOptions;
pub use result::DeployResult;
pub use use_case::DeployUseCase;
