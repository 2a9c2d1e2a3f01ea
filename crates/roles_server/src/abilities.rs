//! Game events and the abilities the server ships with.
//!
//! Each event type gets one [`EventBus`]; each ability gets one instance,
//! registered with the server's [`AbilityRegistry`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use glam::Vec3;
use roles_ability::{
    Ability, AbilityHandle, AbilityInstance, AbilityRegistry, EventBus, PlayerEvent, PlayerId,
};
use serde::Serialize;
use tracing::debug;

/// Height below which the world is dark.
pub const GROUND_LEVEL: f32 = 0.0;

/// A player moved to a new position.
#[derive(Debug, Clone, Copy)]
pub struct PlayerMoved {
    pub player: PlayerId,
    pub position: Vec3,
}

impl PlayerEvent for PlayerMoved {
    fn event_name() -> &'static str {
        "PlayerMoved"
    }

    fn player(&self) -> PlayerId {
        self.player
    }
}

/// A player took damage.
#[derive(Debug, Clone, Copy)]
pub struct PlayerHurt {
    pub player: PlayerId,
    pub damage: f32,
}

impl PlayerEvent for PlayerHurt {
    fn event_name() -> &'static str {
        "PlayerHurt"
    }

    fn player(&self) -> PlayerId {
        self.player
    }
}

/// One bus per event type.
#[derive(Debug, Default)]
pub struct GameEvents {
    pub moved: Arc<EventBus<PlayerMoved>>,
    pub hurt: Arc<EventBus<PlayerHurt>>,
}

/// Boosts the player on every move.
#[derive(Debug, Default)]
pub struct Speed {
    boosts: AtomicU64,
}

impl Ability<PlayerMoved> for Speed {
    const NAME: &'static str = "Speed";

    fn act(&self, event: &PlayerMoved) {
        self.boosts.fetch_add(1, Ordering::Relaxed);
        debug!(player = %event.player, "speed boost");
    }
}

/// Reveals surroundings when the player moves below ground.
#[derive(Debug, Default)]
pub struct NightVision {
    reveals: AtomicU64,
}

impl Ability<PlayerMoved> for NightVision {
    const NAME: &'static str = "NightVision";

    fn act(&self, event: &PlayerMoved) {
        if event.position.y < GROUND_LEVEL {
            self.reveals.fetch_add(1, Ordering::Relaxed);
            debug!(player = %event.player, depth = -event.position.y, "night vision");
        }
    }
}

/// Heals back half of every hit.
#[derive(Debug, Default)]
pub struct Regeneration {
    healed: DashMap<PlayerId, f32>,
}

impl Regeneration {
    /// Total health restored to `player` so far.
    #[must_use]
    pub fn healed(&self, player: PlayerId) -> f32 {
        self.healed.get(&player).map_or(0.0, |amount| *amount)
    }
}

impl Ability<PlayerHurt> for Regeneration {
    const NAME: &'static str = "Regeneration";

    fn act(&self, event: &PlayerHurt) {
        let amount = event.damage * 0.5;
        *self.healed.entry(event.player).or_insert(0.0) += amount;
        debug!(player = %event.player, amount, "regenerated");
    }
}

/// Counters reported by [`AbilitySet::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AbilityStats {
    pub speed_boosts: u64,
    pub night_vision_reveals: u64,
    pub regenerated: f32,
}

/// The server's ability instances.
#[derive(Debug)]
pub struct AbilitySet {
    pub speed: Arc<AbilityInstance<PlayerMoved, Speed>>,
    pub night_vision: Arc<AbilityInstance<PlayerMoved, NightVision>>,
    pub regeneration: Arc<AbilityInstance<PlayerHurt, Regeneration>>,
}

impl AbilitySet {
    /// Create every ability, bound to `events` and registered in `registry`.
    #[must_use]
    pub fn new(registry: &AbilityRegistry, events: &GameEvents) -> Self {
        Self {
            speed: AbilityInstance::new(registry, events.moved.clone(), Speed::default()),
            night_vision: AbilityInstance::new(
                registry,
                events.moved.clone(),
                NightVision::default(),
            ),
            regeneration: AbilityInstance::new(
                registry,
                events.hurt.clone(),
                Regeneration::default(),
            ),
        }
    }

    /// Look an ability up by its name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn AbilityHandle>> {
        let handles: [Arc<dyn AbilityHandle>; 3] = [
            self.speed.clone(),
            self.night_vision.clone(),
            self.regeneration.clone(),
        ];
        handles.into_iter().find(|handle| handle.name() == name)
    }

    /// Snapshot of the ability counters.
    #[must_use]
    pub fn stats(&self) -> AbilityStats {
        AbilityStats {
            speed_boosts: self.speed.behavior().boosts.load(Ordering::Relaxed),
            night_vision_reveals: self.night_vision.behavior().reveals.load(Ordering::Relaxed),
            regenerated: self
                .regeneration
                .behavior()
                .healed
                .iter()
                .map(|entry| *entry.value())
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (AbilityRegistry, GameEvents, AbilitySet) {
        let registry = AbilityRegistry::new();
        let events = GameEvents::default();
        let abilities = AbilitySet::new(&registry, &events);
        (registry, events, abilities)
    }

    #[test]
    fn test_by_name_resolves_every_ability() {
        let (registry, _events, abilities) = setup();
        for name in ["Speed", "NightVision", "Regeneration"] {
            assert_eq!(abilities.by_name(name).unwrap().name(), name);
        }
        assert!(abilities.by_name("Flight").is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_night_vision_only_below_ground() {
        let (_registry, events, abilities) = setup();
        abilities.night_vision.enable();
        abilities.night_vision.enable_for_player(PlayerId(1)).unwrap();

        events.moved.publish(&PlayerMoved {
            player: PlayerId(1),
            position: Vec3::new(0.0, 5.0, 0.0),
        });
        events.moved.publish(&PlayerMoved {
            player: PlayerId(1),
            position: Vec3::new(0.0, -3.0, 0.0),
        });

        assert_eq!(abilities.stats().night_vision_reveals, 1);
    }

    #[test]
    fn test_regeneration_heals_half_the_damage() {
        let (_registry, events, abilities) = setup();
        abilities.regeneration.enable();
        abilities.regeneration.enable_for_player(PlayerId(2)).unwrap();

        events.hurt.publish(&PlayerHurt {
            player: PlayerId(2),
            damage: 40.0,
        });
        events.hurt.publish(&PlayerHurt {
            player: PlayerId(3),
            damage: 40.0,
        });

        assert!((abilities.regeneration.behavior().healed(PlayerId(2)) - 20.0).abs() < f32::EPSILON);
        assert_eq!(abilities.regeneration.behavior().healed(PlayerId(3)), 0.0);
    }
}
