//! `revive-core`: domain foundation shared by the inventory and auth crates.
//!
//! This crate contains **pure domain** primitives (no IO, no persistence).

pub mod entity;
pub mod error;

pub use entity::Entity;
pub use error::{require_non_blank, DomainError, DomainResult};
