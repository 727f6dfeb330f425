//! Immutable panel state published on every change

use keymon_core::RefreshToken;
use serde::Serialize;
use std::fmt;

/// Where the refresh loop currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Panel constructed but the loop has not run yet
    #[default]
    Idle,

    /// A request for the active keys is in flight
    Fetching,

    /// Last request settled; waiting out the refresh delay
    Waiting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Waiting => write!(f, "waiting"),
        }
    }
}

/// One immutable view of the panel's state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PanelSnapshot {
    /// Active keys from the most recent settled refresh
    pub keys: Vec<String>,

    /// Token children use to decide whether to reload
    pub refresh_token: RefreshToken,

    /// Loop phase when this snapshot was taken
    pub phase: Phase,
}

impl PanelSnapshot {
    /// The state of a freshly mounted panel: no keys, token 0
    #[must_use]
    pub fn initial() -> Self {
        Self::default()
    }

    /// Same keys and token, new phase
    #[must_use]
    pub fn with_phase(&self, phase: Phase) -> Self {
        Self {
            keys: self.keys.clone(),
            refresh_token: self.refresh_token,
            phase,
        }
    }

    /// Keys replaced wholesale after a refresh settled
    #[must_use]
    pub fn settled(&self, keys: Vec<String>) -> Self {
        Self {
            keys,
            refresh_token: self.refresh_token,
            phase: Phase::Waiting,
        }
    }

    /// Token advanced after the refresh delay, the next fetch about to start
    #[must_use]
    pub fn advanced(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            refresh_token: self.refresh_token.next(),
            phase: Phase::Fetching,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_initial_snapshot() {
        let snapshot = PanelSnapshot::initial();

        assert!(snapshot.keys.is_empty());
        assert_eq!(snapshot.refresh_token, RefreshToken::INITIAL);
        assert_eq!(snapshot.phase, Phase::Idle);
    }

    #[test]
    fn test_transitions() {
        let fetching = PanelSnapshot::initial().with_phase(Phase::Fetching);
        assert_eq!(fetching.phase, Phase::Fetching);

        let settled = fetching.settled(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(settled.keys, vec!["a", "b"]);
        assert_eq!(settled.refresh_token.get(), 0);
        assert_eq!(settled.phase, Phase::Waiting);

        let advanced = settled.advanced();
        assert_eq!(advanced.keys, vec!["a", "b"]);
        assert_eq!(advanced.refresh_token.get(), 1);
        assert_eq!(advanced.phase, Phase::Fetching);

        let next = advanced.settled(vec!["c".to_string()]);
        assert_eq!(next.keys, vec!["c"]);
        assert_eq!(next.refresh_token.get(), 1);

        // earlier snapshots are untouched
        assert_eq!(settled.keys, vec!["a", "b"]);
        assert_eq!(settled.refresh_token.get(), 0);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Idle.to_string(), "idle");
        assert_eq!(Phase::Fetching.to_string(), "fetching");
        assert_eq!(Phase::Waiting.to_string(), "waiting");
    }
}
