//! Entity traits for locally persisted connector records.

use crate::id::ChannelId;

/// A persisted record with a stable local identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// A record that belongs to exactly one channel.
///
/// Remote identifiers are only meaningful inside the channel they came from,
/// so every mapping record carries the channel it was imported through.
pub trait ChannelScoped: Entity {
    fn channel_id(&self) -> ChannelId;
}
