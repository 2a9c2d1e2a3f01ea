//! Abilities and their shared per-type instances.
//!
//! A concrete ability implements [`Ability`]: a name plus a reaction to one
//! event payload type. The host wraps it in exactly one [`AbilityInstance`],
//! which is shared by every player holding that ability. The instance owns
//! the subscription to the event source and filters occurrences down to the
//! attached players before the behavior ever sees them.
//!
//! Roles talk to instances through the type-erased [`AbilityHandle`]
//! capability, so one role can bundle abilities bound to different events.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::bus::{EventSource, Handler, SubscriptionId};
use crate::error::AbilityError;
use crate::event::PlayerEvent;
use crate::player::PlayerId;
use crate::registry::{AbilityRegistry, GrantGate};

/// Behavior of one ability, reacting to event payload `E`.
///
/// `act` only runs for occurrences originated by an attached player while the
/// ability is enabled; implementations never check attachment themselves.
/// Behaviors are shared across threads and players, so any state they keep
/// needs interior mutability.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use roles_ability::{Ability, PlayerEvent, PlayerId};
///
/// struct Jumped {
///     player: PlayerId,
/// }
///
/// impl PlayerEvent for Jumped {
///     fn event_name() -> &'static str { "Jumped" }
///     fn player(&self) -> PlayerId { self.player }
/// }
///
/// #[derive(Default)]
/// struct DoubleJump {
///     boosts: AtomicU32,
/// }
///
/// impl Ability<Jumped> for DoubleJump {
///     const NAME: &'static str = "DoubleJump";
///
///     fn act(&self, _event: &Jumped) {
///         self.boosts.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait Ability<E: PlayerEvent>: Send + Sync + 'static {
    /// A human-readable, unique name for this ability.
    const NAME: &'static str;

    /// React to an occurrence from an attached player.
    fn act(&self, event: &E);
}

/// Type-erased control surface of an ability instance.
///
/// This is what role definitions hold and what the registry disables in bulk.
pub trait AbilityHandle: Send + Sync {
    /// The ability's name.
    fn name(&self) -> &'static str;

    /// Returns `true` while the ability is globally enabled.
    fn is_enabled(&self) -> bool;

    /// Enable the ability and subscribe its filter to the event source.
    ///
    /// Enabling an enabled ability does not subscribe a second time.
    fn enable(&self);

    /// Disable the ability and unsubscribe its filter.
    ///
    /// Attached players are kept, so a later [`enable`](Self::enable)
    /// restores every grant that is still recorded.
    fn disable(&self);

    /// Attach `player`.
    ///
    /// # Errors
    ///
    /// Returns [`AbilityError::InvalidState`] if the ability is disabled.
    fn enable_for_player(&self, player: PlayerId) -> Result<(), AbilityError>;

    /// Detach `player`. Detaching a player who is not attached is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AbilityError::InvalidState`] if the ability is disabled.
    fn disable_for_player(&self, player: PlayerId) -> Result<(), AbilityError>;

    /// Returns `true` if `player` is attached.
    fn is_attached(&self, player: PlayerId) -> bool;

    /// Returns the attached players, sorted by id.
    fn attached_players(&self) -> Vec<PlayerId>;

    /// Returns the number of attached players.
    fn attached_count(&self) -> usize;
}

/// Mutable state of an instance, guarded by one mutex.
#[derive(Debug, Default)]
struct AbilityState {
    enabled: bool,
    subscription: Option<SubscriptionId>,
    attached: HashSet<PlayerId>,
}

/// The single shared instance of ability `A`, bound to event source `E`.
///
/// Created with [`AbilityInstance::new`], which registers it with an
/// [`AbilityRegistry`]. Dropping the last handle disables the instance.
pub struct AbilityInstance<E: PlayerEvent, A: Ability<E>> {
    behavior: Arc<A>,
    source: Arc<dyn EventSource<E>>,
    state: Arc<Mutex<AbilityState>>,
    gate: GrantGate,
}

impl<E: PlayerEvent, A: Ability<E>> AbilityInstance<E, A> {
    /// Create the instance for `behavior`, listening on `source`, and register
    /// it with `registry`. The instance starts disabled.
    pub fn new(
        registry: &AbilityRegistry,
        source: Arc<dyn EventSource<E>>,
        behavior: A,
    ) -> Arc<Self> {
        let instance = Arc::new(Self {
            behavior: Arc::new(behavior),
            source,
            state: Arc::new(Mutex::new(AbilityState::default())),
            gate: registry.grant_gate(),
        });
        let handle: Arc<dyn AbilityHandle> = instance.clone();
        registry.register(&handle);
        instance
    }

    /// Returns the ability behavior.
    #[must_use]
    pub fn behavior(&self) -> &A {
        &self.behavior
    }

    /// Build the subscriber callback: membership check, then behavior.
    fn filter(&self) -> Handler<E> {
        let state = Arc::clone(&self.state);
        let behavior = Arc::clone(&self.behavior);
        let gate = self.gate.clone();
        Arc::new(move |event: &E| {
            let player = event.player();
            let attached = {
                let _grant = gate.read();
                let state = state.lock();
                // An occurrence already in flight when the ability was
                // disabled must not reach the behavior.
                state.enabled && state.attached.contains(&player)
            };
            if attached {
                trace!(ability = A::NAME, %player, "ability triggered");
                behavior.act(event);
            }
        })
    }
}

impl<E: PlayerEvent, A: Ability<E>> AbilityHandle for AbilityInstance<E, A> {
    fn name(&self) -> &'static str {
        A::NAME
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    fn enable(&self) {
        let mut state = self.state.lock();
        state.enabled = true;
        if state.subscription.is_some() {
            return;
        }
        let id = self.source.subscribe(self.filter());
        state.subscription = Some(id);
        debug!(
            ability = A::NAME,
            event = E::event_name(),
            subscription = %id,
            "ability enabled"
        );
    }

    fn disable(&self) {
        let mut state = self.state.lock();
        let was_enabled = std::mem::replace(&mut state.enabled, false);
        if let Some(id) = state.subscription.take() {
            self.source.unsubscribe(id);
        }
        if was_enabled {
            debug!(
                ability = A::NAME,
                attached = state.attached.len(),
                "ability disabled"
            );
        }
    }

    fn enable_for_player(&self, player: PlayerId) -> Result<(), AbilityError> {
        let mut state = self.state.lock();
        if !state.enabled {
            return Err(AbilityError::InvalidState {
                ability: A::NAME,
                player,
            });
        }
        if state.attached.insert(player) {
            debug!(ability = A::NAME, %player, "ability attached");
        }
        Ok(())
    }

    fn disable_for_player(&self, player: PlayerId) -> Result<(), AbilityError> {
        let mut state = self.state.lock();
        if !state.enabled {
            return Err(AbilityError::InvalidState {
                ability: A::NAME,
                player,
            });
        }
        if state.attached.remove(&player) {
            debug!(ability = A::NAME, %player, "ability detached");
        }
        Ok(())
    }

    fn is_attached(&self, player: PlayerId) -> bool {
        self.state.lock().attached.contains(&player)
    }

    fn attached_players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.state.lock().attached.iter().copied().collect();
        players.sort_unstable();
        players
    }

    fn attached_count(&self) -> usize {
        self.state.lock().attached.len()
    }
}

impl<E: PlayerEvent, A: Ability<E>> Drop for AbilityInstance<E, A> {
    fn drop(&mut self) {
        self.disable();
    }
}

impl<E: PlayerEvent, A: Ability<E>> fmt::Debug for AbilityInstance<E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AbilityInstance")
            .field("name", &A::NAME)
            .field("event", &E::event_name())
            .field("enabled", &state.enabled)
            .field("attached", &state.attached.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::bus::EventBus;

    struct Moved {
        player: PlayerId,
    }

    impl PlayerEvent for Moved {
        fn event_name() -> &'static str {
            "Moved"
        }

        fn player(&self) -> PlayerId {
            self.player
        }
    }

    #[derive(Default)]
    struct Speed {
        hits: AtomicUsize,
    }

    impl Ability<Moved> for Speed {
        const NAME: &'static str = "Speed";

        fn act(&self, _event: &Moved) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup() -> (AbilityRegistry, Arc<EventBus<Moved>>, Arc<AbilityInstance<Moved, Speed>>) {
        let registry = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Moved>::new());
        let speed = AbilityInstance::new(&registry, bus.clone(), Speed::default());
        (registry, bus, speed)
    }

    fn hits(speed: &AbilityInstance<Moved, Speed>) -> usize {
        speed.behavior().hits.load(Ordering::SeqCst)
    }

    #[test]
    fn test_new_instance_is_disabled_and_registered() {
        let (registry, bus, speed) = setup();
        assert!(!speed.is_enabled());
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_disabled_instance_rejects_player_operations() {
        let (_registry, _bus, speed) = setup();
        let err = speed.enable_for_player(PlayerId(1)).unwrap_err();
        assert_eq!(
            err,
            AbilityError::InvalidState {
                ability: "Speed",
                player: PlayerId(1)
            }
        );
        assert!(matches!(
            speed.disable_for_player(PlayerId(1)),
            Err(AbilityError::InvalidState { .. })
        ));
        assert_eq!(speed.attached_count(), 0);
    }

    #[test]
    fn test_enable_twice_subscribes_once() {
        let (_registry, bus, speed) = setup();
        speed.enable();
        speed.enable();
        assert!(speed.is_enabled());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_filter_only_passes_attached_players() {
        let (_registry, bus, speed) = setup();
        speed.enable();
        speed.enable_for_player(PlayerId(1)).unwrap();
        speed.enable_for_player(PlayerId(3)).unwrap();

        // 10 occurrences, 4 of them from attached players.
        for raw in [1, 2, 3, 4, 5, 1, 2, 6, 3, 7] {
            bus.publish(&Moved {
                player: PlayerId(raw),
            });
        }
        assert_eq!(hits(&speed), 4);
    }

    #[test]
    fn test_enable_for_player_is_idempotent() {
        let (_registry, bus, speed) = setup();
        speed.enable();
        speed.enable_for_player(PlayerId(1)).unwrap();
        speed.enable_for_player(PlayerId(1)).unwrap();
        assert_eq!(speed.attached_players(), vec![PlayerId(1)]);

        bus.publish(&Moved { player: PlayerId(1) });
        assert_eq!(hits(&speed), 1);

        speed.disable_for_player(PlayerId(1)).unwrap();
        assert!(!speed.is_attached(PlayerId(1)));
    }

    #[test]
    fn test_disable_for_absent_player_is_noop() {
        let (_registry, _bus, speed) = setup();
        speed.enable();
        assert!(speed.disable_for_player(PlayerId(9)).is_ok());
        assert_eq!(speed.attached_count(), 0);
    }

    #[test]
    fn test_disable_unsubscribes_but_keeps_attached_players() {
        let (_registry, bus, speed) = setup();
        speed.enable();
        speed.enable_for_player(PlayerId(1)).unwrap();
        speed.disable();

        assert!(!speed.is_enabled());
        assert_eq!(bus.subscriber_count(), 0);
        assert!(speed.is_attached(PlayerId(1)));

        bus.publish(&Moved { player: PlayerId(1) });
        assert_eq!(hits(&speed), 0);

        speed.enable();
        bus.publish(&Moved { player: PlayerId(1) });
        assert_eq!(hits(&speed), 1);
    }

    #[test]
    fn test_dropping_instance_unsubscribes() {
        let (registry, bus, speed) = setup();
        speed.enable();
        assert_eq!(bus.subscriber_count(), 1);
        drop(speed);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_handle_reports_name() {
        let (_registry, _bus, speed) = setup();
        let handle: Arc<dyn AbilityHandle> = speed;
        assert_eq!(handle.name(), "Speed");
    }
}
