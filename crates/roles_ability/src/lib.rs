//! # roles_ability
//!
//! Event-driven abilities for the custom roles layer.
//!
//! An ability is a unit of player behavior bound to one event type. There is
//! exactly one instance per ability type; it is globally enabled or disabled,
//! and individually attached to the players who currently hold it. Every
//! occurrence from the event source is filtered down to attached players
//! before the ability's behavior runs.
//!
//! This crate provides:
//!
//! - [`PlayerId`] / [`PlayerAllocator`] — opaque player identity.
//! - [`PlayerEvent`] — the contract every event payload satisfies.
//! - [`EventSource`] / [`EventBus`] — token-based observer registration.
//! - [`Ability`] / [`AbilityInstance`] — behavior plus its shared instance.
//! - [`AbilityHandle`] — the type-erased capability roles compose.
//! - [`AbilityRegistry`] — process-wide list used for bulk disable.

pub mod ability;
pub mod bus;
pub mod error;
pub mod event;
pub mod player;
pub mod registry;

pub use ability::{Ability, AbilityHandle, AbilityInstance};
pub use bus::{EventBus, EventSource, Handler, SubscriptionId};
pub use error::AbilityError;
pub use event::PlayerEvent;
pub use player::{PlayerAllocator, PlayerId};
pub use registry::{AbilityRegistry, GrantGate};
