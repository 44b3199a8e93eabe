//! Inventory domain module.
//!
//! Admin-defined item types (free-form attribute schemas) and the items
//! created under them, implemented purely as deterministic domain logic
//! (no IO, no storage).

pub mod item;
pub mod registry;

pub use item::{normalize_attributes, ItemRecord, ItemType, NAME_ATTRIBUTE};
pub use registry::{Search, TypeRegistry};
