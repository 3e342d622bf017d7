//! Domain Value Objects
//!
//! Immutable value types parsed once from user input and never re-interpreted.

mod command;
mod event_category;
mod image;
mod launch_type;
mod module_version;
mod task_ref;
mod wait_timeout;

pub use command::ParsedCommand;
pub use event_category::{EventCategory, EventSeverity};
pub use image::ImageRef;
pub use launch_type::LaunchType;
pub use module_version::ModuleVersion;
pub use task_ref::TaskRef;
pub use wait_timeout::{WaitTimeout, NO_WAIT_SENTINEL};
