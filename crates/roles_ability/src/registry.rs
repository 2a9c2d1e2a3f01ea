//! Ability registry — tracks every ability instance in the process.
//!
//! Each [`AbilityInstance`](crate::AbilityInstance) registers itself on
//! construction. The registry only holds weak references: it never keeps an
//! ability alive, it only finds the live ones when the host needs to disable
//! them all (for example on a server reload).
//!
//! The registry also owns the [`GrantGate`] shared by its abilities. Role
//! attach/detach holds the gate exclusively while it updates several
//! abilities, and every attachment check holds it shared, so a check never
//! observes a half-applied grant.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::ability::AbilityHandle;

/// Reader/writer lock serializing grant changes against attachment checks.
#[derive(Debug, Clone, Default)]
pub struct GrantGate(Arc<RwLock<()>>);

impl GrantGate {
    /// Hold the gate shared, for the duration of an attachment check.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.0.read()
    }

    /// Hold the gate exclusively, for the duration of a grant change.
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.0.write()
    }
}

/// Registry of all ability instances known to the process.
#[derive(Default)]
pub struct AbilityRegistry {
    abilities: Mutex<Vec<Weak<dyn AbilityHandle>>>,
    gate: GrantGate,
}

impl AbilityRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            abilities: Mutex::new(Vec::new()),
            gate: GrantGate::default(),
        }
    }

    /// Record an ability instance. Called by the instance constructor.
    pub fn register(&self, ability: &Arc<dyn AbilityHandle>) {
        self.abilities.lock().push(Arc::downgrade(ability));
    }

    /// Returns the gate shared by every ability in this registry.
    #[must_use]
    pub fn grant_gate(&self) -> GrantGate {
        self.gate.clone()
    }

    /// Returns strong handles to every live ability, in registration order.
    ///
    /// Entries for dropped abilities are pruned along the way.
    #[must_use]
    pub fn abilities(&self) -> Vec<Arc<dyn AbilityHandle>> {
        let mut abilities = self.abilities.lock();
        abilities.retain(|weak| weak.strong_count() > 0);
        abilities.iter().filter_map(Weak::upgrade).collect()
    }

    /// Disable every live ability.
    ///
    /// Returns the number of abilities that were enabled beforehand.
    pub fn disable_all(&self) -> usize {
        // The snapshot is taken first so `disable` runs without the list lock.
        let live = self.abilities();
        let mut disabled = 0;
        for ability in &live {
            if ability.is_enabled() {
                disabled += 1;
            }
            ability.disable();
        }
        info!(abilities = live.len(), disabled, "disabled all abilities");
        disabled
    }

    /// Returns the number of live abilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Returns `true` if no live abilities are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for AbilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.abilities().iter().map(|a| a.name()).collect();
        f.debug_struct("AbilityRegistry")
            .field("abilities", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ability::{Ability, AbilityInstance};
    use crate::bus::EventBus;
    use crate::event::PlayerEvent;
    use crate::player::PlayerId;

    struct Hurt {
        player: PlayerId,
    }

    impl PlayerEvent for Hurt {
        fn event_name() -> &'static str {
            "Hurt"
        }

        fn player(&self) -> PlayerId {
            self.player
        }
    }

    #[derive(Default)]
    struct Regeneration(AtomicUsize);

    impl Ability<Hurt> for Regeneration {
        const NAME: &'static str = "Regeneration";

        fn act(&self, _event: &Hurt) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Thorns(AtomicUsize);

    impl Ability<Hurt> for Thorns {
        const NAME: &'static str = "Thorns";

        fn act(&self, _event: &Hurt) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_register_keeps_order() {
        let registry = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Hurt>::new());
        let _regen = AbilityInstance::new(&registry, bus.clone(), Regeneration::default());
        let _thorns = AbilityInstance::new(&registry, bus, Thorns::default());

        assert_eq!(registry.len(), 2);
        let names: Vec<_> = registry.abilities().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Regeneration", "Thorns"]);
    }

    #[test]
    fn test_disable_all_silences_every_ability() {
        let registry = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Hurt>::new());
        let regen = AbilityInstance::new(&registry, bus.clone(), Regeneration::default());
        let thorns = AbilityInstance::new(&registry, bus.clone(), Thorns::default());
        let handles: [Arc<dyn AbilityHandle>; 2] = [regen.clone(), thorns.clone()];
        for ability in handles {
            ability.enable();
            ability.enable_for_player(PlayerId(1)).unwrap();
        }

        assert_eq!(registry.disable_all(), 2);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!regen.is_enabled());
        assert!(!thorns.is_enabled());

        assert_eq!(bus.publish(&Hurt { player: PlayerId(1) }), 0);
        assert_eq!(regen.behavior().0.load(Ordering::SeqCst), 0);
        assert_eq!(thorns.behavior().0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disable_all_counts_only_enabled() {
        let registry = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Hurt>::new());
        let regen = AbilityInstance::new(&registry, bus.clone(), Regeneration::default());
        let _thorns = AbilityInstance::new(&registry, bus, Thorns::default());
        regen.enable();
        assert_eq!(registry.disable_all(), 1);
    }

    #[test]
    fn test_dropped_abilities_are_pruned() {
        let registry = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Hurt>::new());
        let regen = AbilityInstance::new(&registry, bus.clone(), Regeneration::default());
        let _thorns = AbilityInstance::new(&registry, bus, Thorns::default());
        drop(regen);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.abilities().len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_registries_are_independent() {
        let first = AbilityRegistry::new();
        let second = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Hurt>::new());
        let regen = AbilityInstance::new(&first, bus.clone(), Regeneration::default());
        let thorns = AbilityInstance::new(&second, bus.clone(), Thorns::default());
        regen.enable();
        thorns.enable();

        first.disable_all();
        assert!(!regen.is_enabled());
        assert!(thorns.is_enabled());
        assert_eq!(bus.subscriber_count(), 1);
    }
}
