//! Player identity.
//!
//! A [`PlayerId`] is an opaque handle for one connected player. Equality is
//! stable for the whole session, so ids key both the attached-player sets and
//! the per-player role store.

use serde::{Deserialize, Serialize};

/// Identifier of a connected player.
///
/// Nicknames, base roles and other session state live with the host, keyed
/// by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player #{}", self.0)
    }
}

/// Hands out player ids as players join.
///
/// Ids are never reused within a session; a player who reconnects gets a new
/// id, which drops any grant tied to the old one.
#[derive(Debug)]
pub struct PlayerAllocator {
    next: u64,
}

impl PlayerAllocator {
    /// Creates a new allocator. The first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocates the id for a newly joined player.
    pub fn allocate(&mut self) -> PlayerId {
        let player = PlayerId(self.next);
        self.next += 1;
        player
    }
}

impl Default for PlayerAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_never_reuses_ids() {
        let mut alloc = PlayerAllocator::new();
        let ids: Vec<PlayerId> = (0..3).map(|_| alloc.allocate()).collect();
        assert_eq!(ids, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_display_names_the_player() {
        assert_eq!(PlayerId(7).to_string(), "player #7");
    }

    #[test]
    fn test_player_id_is_transparent_in_json() {
        let json = serde_json::to_string(&PlayerId(5)).unwrap();
        assert_eq!(json, "5");
    }
}
