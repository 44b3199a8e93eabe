//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Registries key their owned entities by [`Entity::id`], so the identifier
/// must stay stable for the entity's lifetime.
pub trait Entity {
    /// Natural key of the entity (type name, username, ...).
    type Id: Clone + Ord + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
