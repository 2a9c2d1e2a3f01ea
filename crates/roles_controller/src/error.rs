//! Role controller error types.

use roles_ability::{AbilityError, PlayerId};

use crate::store::StoreError;

/// Errors raised by [`RoleController`](crate::RoleController) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    /// Attach was requested for a player who already holds a role.
    #[error("{player} already has a custom role ({role})")]
    AlreadyHasRole {
        /// The player the attach targeted.
        player: PlayerId,
        /// Name of the role the player currently holds.
        role: String,
    },

    /// Detach was requested for a player without a role.
    #[error("{player} does not have a custom role")]
    NoRoleAssigned {
        /// The player the detach targeted.
        player: PlayerId,
    },

    /// One of the role's abilities rejected the grant change. Every change
    /// already applied for this request has been rolled back.
    #[error(transparent)]
    Ability(#[from] AbilityError),

    /// The role store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}
