//! The [`PlayerEvent`] contract.
//!
//! Every occurrence an ability can react to implements [`PlayerEvent`]: it
//! names the player who originated it, which is all the ability filter needs.
//! The rest of the payload is opaque to this crate.

use crate::player::PlayerId;

/// An occurrence originated by a player.
///
/// Payloads are delivered by reference to every subscriber of an event
/// source, possibly from several threads, hence `Send + Sync + 'static`.
///
/// # Examples
///
/// ```rust
/// use roles_ability::{PlayerEvent, PlayerId};
///
/// #[derive(Debug, Clone)]
/// struct Jumped {
///     player: PlayerId,
///     height: f32,
/// }
///
/// impl PlayerEvent for Jumped {
///     fn event_name() -> &'static str { "Jumped" }
///     fn player(&self) -> PlayerId { self.player }
/// }
/// ```
pub trait PlayerEvent: Send + Sync + 'static {
    /// A human-readable name for this event type.
    fn event_name() -> &'static str;

    /// The player this occurrence originated from.
    fn player(&self) -> PlayerId;
}
