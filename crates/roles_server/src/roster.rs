//! Connected players and their underlying game roles.

use dashmap::DashMap;
use roles_ability::PlayerId;
use roles_controller::{BaseRoleId, RoleHost};
use tracing::debug;

/// Base role every player spawns with.
pub const SPECTATOR: BaseRoleId = BaseRoleId(0);

/// What the server knows about one connected player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub nickname: String,
    pub base_role: BaseRoleId,
}

/// Connected players, keyed by id.
#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: DashMap<PlayerId, PlayerInfo>,
}

impl PlayerRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly joined player as a spectator.
    pub fn join(&self, player: PlayerId, nickname: impl Into<String>) {
        let nickname = nickname.into();
        debug!(%player, %nickname, "player joined");
        self.players.insert(
            player,
            PlayerInfo {
                nickname,
                base_role: SPECTATOR,
            },
        );
    }

    /// Forget a player. Returns what was known about them.
    pub fn leave(&self, player: PlayerId) -> Option<PlayerInfo> {
        self.players.remove(&player).map(|(_, info)| info)
    }

    /// Returns `true` if the player is connected.
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    /// The player's nickname, or their id if unknown.
    #[must_use]
    pub fn nickname(&self, player: PlayerId) -> String {
        self.players
            .get(&player)
            .map_or_else(|| player.to_string(), |info| info.nickname.clone())
    }

    /// Returns the number of connected players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }
}

impl RoleHost for PlayerRoster {
    fn base_role(&self, player: PlayerId) -> Option<BaseRoleId> {
        self.players.get(&player).map(|info| info.base_role)
    }

    fn set_base_role(&self, player: PlayerId, role: BaseRoleId) {
        if let Some(mut info) = self.players.get_mut(&player) {
            info.base_role = role;
            debug!(%player, %role, "base role set");
        }
    }

    fn clear_base_role(&self, player: PlayerId) {
        // Joined players always hold a base role; back to the spawn one.
        if let Some(mut info) = self.players.get_mut(&player) {
            info.base_role = SPECTATOR;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_as_spectator() {
        let roster = PlayerRoster::new();
        roster.join(PlayerId(1), "alice");
        assert_eq!(roster.nickname(PlayerId(1)), "alice");
        assert_eq!(roster.base_role(PlayerId(1)), Some(SPECTATOR));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_set_base_role_for_known_player() {
        let roster = PlayerRoster::new();
        roster.join(PlayerId(1), "alice");
        roster.set_base_role(PlayerId(1), BaseRoleId(3));
        assert_eq!(roster.base_role(PlayerId(1)), Some(BaseRoleId(3)));
    }

    #[test]
    fn test_clear_base_role_returns_to_spectator() {
        let roster = PlayerRoster::new();
        roster.join(PlayerId(1), "alice");
        roster.set_base_role(PlayerId(1), BaseRoleId(3));
        roster.clear_base_role(PlayerId(1));
        assert_eq!(roster.base_role(PlayerId(1)), Some(SPECTATOR));
    }

    #[test]
    fn test_unknown_player_is_ignored() {
        let roster = PlayerRoster::new();
        roster.set_base_role(PlayerId(8), BaseRoleId(3));
        assert_eq!(roster.base_role(PlayerId(8)), None);
        assert_eq!(roster.nickname(PlayerId(8)), "player #8");
    }

    #[test]
    fn test_leave_removes_player() {
        let roster = PlayerRoster::new();
        roster.join(PlayerId(1), "alice");
        assert_eq!(roster.leave(PlayerId(1)).unwrap().nickname, "alice");
        assert!(!roster.contains(PlayerId(1)));
    }
}
