//! Role controller — grants and revokes custom roles.
//!
//! Each player is either without a custom role or holds exactly one:
//!
//! ```text
//!            attach(role)
//!   NoRole ───────────────▶ HasRole(role)
//!          ◀───────────────
//!               detach
//! ```
//!
//! `attach` from `HasRole` and `detach` from `NoRole` are rejected without
//! touching any state. Transitions are serialized against each other. Both
//! update the role store and every ability of the role while holding the
//! registry's [`GrantGate`], and undo their partial work if one ability
//! refuses, so callers and concurrent event filters only ever see the whole
//! grant or none of it.
//!
//! The host's base role is switched before the gate is taken: hosts may
//! publish player events from [`RoleHost::set_base_role`], and those reach
//! ability filters on the same thread. Hosts must not call back into the
//! controller from there.

use std::sync::Arc;

use parking_lot::Mutex;
use roles_ability::{AbilityError, AbilityHandle, AbilityRegistry, GrantGate, PlayerId};
use tracing::{debug, warn};

use crate::error::RoleError;
use crate::host::{BaseRoleId, RoleHost};
use crate::role::RoleDefinition;
use crate::store::{ROLE_SESSION_KEY, RoleStore};

/// Attaches and detaches role definitions for players.
pub struct RoleController {
    store: Arc<dyn RoleStore>,
    host: Arc<dyn RoleHost>,
    gate: GrantGate,
    transitions: Mutex<()>,
}

impl RoleController {
    /// Create a controller for the abilities of `registry`.
    #[must_use]
    pub fn new(
        registry: &AbilityRegistry,
        store: Arc<dyn RoleStore>,
        host: Arc<dyn RoleHost>,
    ) -> Self {
        Self {
            store,
            host,
            gate: registry.grant_gate(),
            transitions: Mutex::new(()),
        }
    }

    /// Grant `role` to `player`.
    ///
    /// Switches the player's base role, attaches every ability in order,
    /// records the role in the store, then runs the role's post-attach hook.
    ///
    /// # Errors
    ///
    /// - [`RoleError::AlreadyHasRole`] if the player already holds a role.
    /// - [`RoleError::Ability`] if an ability is disabled. A role with a
    ///   disabled ability is refused before the host is touched; if an
    ///   ability is disabled midway, the abilities attached so far are
    ///   detached and the base role is restored.
    pub fn attach(&self, player: PlayerId, role: &Arc<RoleDefinition>) -> Result<(), RoleError> {
        {
            let _transition = self.transitions.lock();

            if let Some(current) = self.store.get(player) {
                return Err(RoleError::AlreadyHasRole {
                    player,
                    role: current.name().to_string(),
                });
            }
            if let Some(ability) = role.abilities().iter().find(|a| !a.is_enabled()) {
                return Err(AbilityError::InvalidState {
                    ability: ability.name(),
                    player,
                }
                .into());
            }

            let previous = self.host.base_role(player);
            self.host.set_base_role(player, role.base_role());

            if let Err(err) = self.grant_role(player, role) {
                self.restore_base_role(player, previous);
                return Err(err);
            }

            debug!(
                %player,
                role = role.name(),
                key = ROLE_SESSION_KEY,
                abilities = role.abilities().len(),
                "role attached"
            );
        }

        role.run_attach_hook(player);
        Ok(())
    }

    /// Revoke the role `player` holds and return it.
    ///
    /// Detaches every ability of the stored role in order, then removes the
    /// store entry. The player's base role is left as it is.
    ///
    /// # Errors
    ///
    /// - [`RoleError::NoRoleAssigned`] if the player holds no role.
    /// - [`RoleError::Ability`] if an ability is disabled; abilities detached
    ///   so far are re-attached and the store entry is kept.
    pub fn detach(&self, player: PlayerId) -> Result<Arc<RoleDefinition>, RoleError> {
        let _transition = self.transitions.lock();
        let _grant = self.gate.write();

        let role = self
            .store
            .get(player)
            .ok_or(RoleError::NoRoleAssigned { player })?;

        let mut revoked: Vec<&Arc<dyn AbilityHandle>> = Vec::new();
        for ability in role.abilities() {
            let attached = ability.is_attached(player);
            if let Err(err) = ability.disable_for_player(player) {
                grant(&revoked, player);
                return Err(err.into());
            }
            if attached {
                revoked.push(ability);
            }
        }

        self.store.remove(player);
        debug!(
            %player,
            role = role.name(),
            key = ROLE_SESSION_KEY,
            "role detached"
        );
        Ok(role)
    }

    /// Returns the role `player` holds.
    #[must_use]
    pub fn role_of(&self, player: PlayerId) -> Option<Arc<RoleDefinition>> {
        self.store.get(player)
    }

    /// Returns `true` if `player` holds a role.
    #[must_use]
    pub fn has_role(&self, player: PlayerId) -> bool {
        self.store.contains(player)
    }

    /// Returns the number of players holding a role.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.store.len()
    }

    /// Attach every ability of `role` and record it, all or nothing.
    fn grant_role(&self, player: PlayerId, role: &Arc<RoleDefinition>) -> Result<(), RoleError> {
        let _grant = self.gate.write();

        let mut granted: Vec<&Arc<dyn AbilityHandle>> = Vec::new();
        let outcome = role
            .abilities()
            .iter()
            .try_for_each(|ability| {
                let already = ability.is_attached(player);
                ability.enable_for_player(player)?;
                if !already {
                    granted.push(ability);
                }
                Ok::<_, RoleError>(())
            })
            .and_then(|()| Ok(self.store.insert(player, Arc::clone(role))?));

        if outcome.is_err() {
            revoke(&granted, player);
        }
        outcome
    }

    fn restore_base_role(&self, player: PlayerId, previous: Option<BaseRoleId>) {
        match previous {
            Some(previous) => self.host.set_base_role(player, previous),
            None => self.host.clear_base_role(player),
        }
    }
}

impl std::fmt::Debug for RoleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleController")
            .field("assigned", &self.store.len())
            .finish()
    }
}

/// Roll back attaches made by a failed `attach`, newest first.
fn revoke(abilities: &[&Arc<dyn AbilityHandle>], player: PlayerId) {
    for ability in abilities.iter().rev() {
        if let Err(err) = ability.disable_for_player(player) {
            warn!(%player, ability = ability.name(), %err, "rollback left ability attached");
        }
    }
}

/// Roll back detaches made by a failed `detach`, newest first.
fn grant(abilities: &[&Arc<dyn AbilityHandle>], player: PlayerId) {
    for ability in abilities.iter().rev() {
        if let Err(err) = ability.enable_for_player(player) {
            warn!(%player, ability = ability.name(), %err, "rollback left ability detached");
        }
    }
}
