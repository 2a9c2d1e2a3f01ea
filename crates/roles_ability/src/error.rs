//! Ability error types.

use crate::player::PlayerId;

/// Errors raised by per-player ability operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbilityError {
    /// A per-player operation was invoked while the ability is globally
    /// disabled.
    #[error("ability {ability} is disabled; cannot update {player}")]
    InvalidState {
        /// Name of the ability.
        ability: &'static str,
        /// The player the operation targeted.
        player: PlayerId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_names_ability_and_player() {
        let err = AbilityError::InvalidState {
            ability: "Speed",
            player: PlayerId(1),
        };
        assert_eq!(err.to_string(), "ability Speed is disabled; cannot update player #1");
    }
}
