//! Per-player role store.
//!
//! The store records which role each player currently holds. It is the
//! authority for the single-role rule: a player key is present exactly while
//! every ability of the stored role has that player attached.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use roles_ability::PlayerId;

use crate::role::RoleDefinition;

/// Session key under which a player's custom role is recorded.
pub const ROLE_SESSION_KEY: &str = "roles/custom-role";

/// Errors raised by [`RoleStore`] writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The player already has an entry.
    #[error("{player} already has a `{key}` entry", key = ROLE_SESSION_KEY)]
    Occupied {
        /// The player whose slot is taken.
        player: PlayerId,
    },
}

/// Session-scoped mapping from player to the role they hold.
pub trait RoleStore: Send + Sync {
    /// Returns `true` if the player has a role entry.
    fn contains(&self, player: PlayerId) -> bool;

    /// Record `role` for `player`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Occupied`] if the player already has an entry.
    fn insert(&self, player: PlayerId, role: Arc<RoleDefinition>) -> Result<(), StoreError>;

    /// Remove and return the player's entry.
    fn remove(&self, player: PlayerId) -> Option<Arc<RoleDefinition>>;

    /// Returns the role the player holds.
    fn get(&self, player: PlayerId) -> Option<Arc<RoleDefinition>>;

    /// Returns the number of players holding a role.
    fn len(&self) -> usize;

    /// Returns `true` if no player holds a role.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`RoleStore`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct SessionRoleStore {
    roles: DashMap<PlayerId, Arc<RoleDefinition>>,
}

impl SessionRoleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: DashMap::new(),
        }
    }
}

impl RoleStore for SessionRoleStore {
    fn contains(&self, player: PlayerId) -> bool {
        self.roles.contains_key(&player)
    }

    fn insert(&self, player: PlayerId, role: Arc<RoleDefinition>) -> Result<(), StoreError> {
        match self.roles.entry(player) {
            Entry::Occupied(_) => Err(StoreError::Occupied { player }),
            Entry::Vacant(slot) => {
                slot.insert(role);
                Ok(())
            }
        }
    }

    fn remove(&self, player: PlayerId) -> Option<Arc<RoleDefinition>> {
        self.roles.remove(&player).map(|(_, role)| role)
    }

    fn get(&self, player: PlayerId) -> Option<Arc<RoleDefinition>> {
        self.roles.get(&player).map(|entry| Arc::clone(entry.value()))
    }

    fn len(&self) -> usize {
        self.roles.len()
    }
}
