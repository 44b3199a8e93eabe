//! Console front end for the item registry: environment configuration and
//! the interactive menu loop.

pub mod config;
pub mod menu;

pub use config::{AuditTarget, Config, ConfigError};
pub use menu::Menu;
