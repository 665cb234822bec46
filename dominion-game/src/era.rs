use serde::{Deserialize, Serialize};

use crate::constants::ERA_CHANGE_COOLDOWN_ROUNDS;

/// Technological era. Ordered: `Past < Present < Future`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Past,
    #[default]
    Present,
    Future,
}

impl Era {
    pub const ALL: [Self; 3] = [Self::Past, Self::Present, Self::Future];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Present => "present",
            Self::Future => "future",
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Past => Some(Self::Present),
            Self::Present => Some(Self::Future),
            Self::Future => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Past => None,
            Self::Present => Some(Self::Past),
            Self::Future => Some(Self::Present),
        }
    }
}

/// Whether an empire whose era last changed in `changed_round` may change
/// again in `current_round`.
#[must_use]
pub const fn era_change_ready(changed_round: Option<u32>, current_round: u32) -> bool {
    match changed_round {
        None => true,
        Some(round) => current_round >= round.saturating_add(ERA_CHANGE_COOLDOWN_ROUNDS),
    }
}

/// Attacks (and non-reconnaissance spells) require the same era unless the
/// actor holds an active gate.
#[must_use]
pub fn eras_compatible(actor: Era, target: Era, actor_gate_active: bool) -> bool {
    actor == target || actor_gate_active
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eras_are_ordered() {
        assert!(Era::Past < Era::Present);
        assert!(Era::Present < Era::Future);
        assert_eq!(Era::Past.next(), Some(Era::Present));
        assert_eq!(Era::Future.next(), None);
        assert_eq!(Era::Past.previous(), None);
    }

    #[test]
    fn cooldown_blocks_rapid_changes() {
        assert!(era_change_ready(None, 1));
        assert!(!era_change_ready(Some(4), 6));
        assert!(era_change_ready(Some(4), 7));
    }

    #[test]
    fn gate_bridges_eras() {
        assert!(eras_compatible(Era::Past, Era::Past, false));
        assert!(!eras_compatible(Era::Past, Era::Future, false));
        assert!(eras_compatible(Era::Past, Era::Future, true));
    }
}
