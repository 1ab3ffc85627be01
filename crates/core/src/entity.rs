//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Accounts and transactions are entities: two balances may be equal, but an
/// account is only ever the same account if its number matches.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
