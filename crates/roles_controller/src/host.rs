//! Host collaborator that owns each player's underlying game role.

use roles_ability::PlayerId;
use serde::{Deserialize, Serialize};

/// Identifier of an underlying game role (the skin and kit a custom role is
/// built on). The host defines what each value means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseRoleId(pub u32);

impl std::fmt::Display for BaseRoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "base role {}", self.0)
    }
}

/// Game-side operations the controller needs from the host.
pub trait RoleHost: Send + Sync {
    /// The player's current underlying role, if the host knows the player.
    fn base_role(&self, player: PlayerId) -> Option<BaseRoleId>;

    /// Switch the player's underlying role.
    ///
    /// Called outside the grant gate, so the host may publish player events
    /// (spawn, role change) from here.
    fn set_base_role(&self, player: PlayerId, role: BaseRoleId);

    /// Undo a [`set_base_role`](Self::set_base_role) for a player who had no
    /// underlying role beforehand.
    fn clear_base_role(&self, player: PlayerId);
}
