//! Custom role definitions.
//!
//! A [`RoleDefinition`] is a template: a base game role plus a fixed, ordered
//! list of abilities. One definition is shared by every player it is attached
//! to; the per-player bookkeeping lives in the abilities and the role store.

use std::fmt;
use std::sync::Arc;

use roles_ability::{AbilityHandle, PlayerId};
use tracing::debug;

use crate::host::BaseRoleId;

/// Callback run once a role has been attached to a player.
pub type AttachHook = Box<dyn Fn(PlayerId) + Send + Sync>;

/// A named bundle of abilities on top of a base game role.
pub struct RoleDefinition {
    name: String,
    base_role: BaseRoleId,
    abilities: Vec<Arc<dyn AbilityHandle>>,
    on_attach: Option<AttachHook>,
}

impl RoleDefinition {
    /// Start building a role called `name` on top of `base_role`.
    #[must_use]
    pub fn builder(name: impl Into<String>, base_role: BaseRoleId) -> RoleBuilder {
        RoleBuilder {
            name: name.into(),
            base_role,
            abilities: Vec::new(),
            on_attach: None,
            enable_abilities: false,
        }
    }

    /// The role's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying game role players are switched to on attach.
    #[must_use]
    pub fn base_role(&self) -> BaseRoleId {
        self.base_role
    }

    /// The role's abilities, in attach order.
    #[must_use]
    pub fn abilities(&self) -> &[Arc<dyn AbilityHandle>] {
        &self.abilities
    }

    /// Run the post-attach hook, if any.
    pub(crate) fn run_attach_hook(&self, player: PlayerId) {
        if let Some(hook) = &self.on_attach {
            hook(player);
        }
    }
}

impl fmt::Debug for RoleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abilities: Vec<&'static str> = self.abilities.iter().map(|a| a.name()).collect();
        f.debug_struct("RoleDefinition")
            .field("name", &self.name)
            .field("base_role", &self.base_role)
            .field("abilities", &abilities)
            .field("on_attach", &self.on_attach.is_some())
            .finish()
    }
}

/// Builder for [`RoleDefinition`].
#[must_use]
pub struct RoleBuilder {
    name: String,
    base_role: BaseRoleId,
    abilities: Vec<Arc<dyn AbilityHandle>>,
    on_attach: Option<AttachHook>,
    enable_abilities: bool,
}

impl RoleBuilder {
    /// Append one ability.
    pub fn ability(mut self, ability: Arc<dyn AbilityHandle>) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Append several abilities, keeping their order.
    pub fn abilities(mut self, abilities: impl IntoIterator<Item = Arc<dyn AbilityHandle>>) -> Self {
        self.abilities.extend(abilities);
        self
    }

    /// Run `hook` after each successful attach.
    pub fn on_attach(mut self, hook: impl Fn(PlayerId) + Send + Sync + 'static) -> Self {
        self.on_attach = Some(Box::new(hook));
        self
    }

    /// Globally enable every ability as soon as the role is built.
    pub fn enable_abilities(mut self, enable: bool) -> Self {
        self.enable_abilities = enable;
        self
    }

    /// Finish the definition.
    pub fn build(self) -> Arc<RoleDefinition> {
        if self.enable_abilities {
            for ability in &self.abilities {
                ability.enable();
            }
        }
        debug!(
            role = %self.name,
            base_role = %self.base_role,
            abilities = self.abilities.len(),
            enabled = self.enable_abilities,
            "role defined"
        );
        Arc::new(RoleDefinition {
            name: self.name,
            base_role: self.base_role,
            abilities: self.abilities,
            on_attach: self.on_attach,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use roles_ability::{Ability, AbilityInstance, AbilityRegistry, EventBus, PlayerEvent};

    use super::*;

    struct Spawned {
        player: PlayerId,
    }

    impl PlayerEvent for Spawned {
        fn event_name() -> &'static str {
            "Spawned"
        }

        fn player(&self) -> PlayerId {
            self.player
        }
    }

    struct Armor;

    impl Ability<Spawned> for Armor {
        const NAME: &'static str = "Armor";

        fn act(&self, _event: &Spawned) {}
    }

    #[test]
    fn test_builder_keeps_ability_order() {
        let registry = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Spawned>::new());
        let armor: Arc<dyn AbilityHandle> = AbilityInstance::new(&registry, bus, Armor);

        let role = RoleDefinition::builder("Guard", BaseRoleId(4))
            .ability(armor.clone())
            .build();

        assert_eq!(role.name(), "Guard");
        assert_eq!(role.base_role(), BaseRoleId(4));
        let names: Vec<_> = role.abilities().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Armor"]);
        assert!(!armor.is_enabled());
    }

    #[test]
    fn test_enable_abilities_on_build() {
        let registry = AbilityRegistry::new();
        let bus = Arc::new(EventBus::<Spawned>::new());
        let armor: Arc<dyn AbilityHandle> = AbilityInstance::new(&registry, bus.clone(), Armor);

        let _role = RoleDefinition::builder("Guard", BaseRoleId(4))
            .abilities([armor.clone()])
            .enable_abilities(true)
            .build();

        assert!(armor.is_enabled());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_attach_hook_runs_with_player() {
        let seen = Arc::new(AtomicU64::new(0));
        let role = {
            let seen = Arc::clone(&seen);
            RoleDefinition::builder("Guard", BaseRoleId(4))
                .on_attach(move |player| seen.store(player.0, Ordering::SeqCst))
                .build()
        };
        role.run_attach_hook(PlayerId(12));
        assert_eq!(seen.load(Ordering::SeqCst), 12);
    }
}
