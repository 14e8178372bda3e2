//! Error types surfaced by the mission engine.
use crate::ledger::PlayerId;
use crate::mission::MissionId;
use crate::session::SessionPhase;
use thiserror::Error;

/// Failures raised by mission operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissionError {
    /// Player cannot cover the entry cost; nothing was charged.
    #[error("insufficient $CRIME: mission costs {required}, player has {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("{0} not found")]
    MissionNotFound(MissionId),

    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// Operation attempted on a session that is not in progress.
    #[error("cannot {operation} while session is {phase}")]
    InvalidSessionState {
        phase: SessionPhase,
        operation: &'static str,
    },

    /// Resolution requested before progress reached 100.
    #[error("mission progress is {progress}%, resolution requires 100%")]
    MissionIncomplete { progress: u8 },

    /// No live session exists for the player/mission pair.
    #[error("no active session for player {player} on {mission}")]
    NoActiveSession { player: PlayerId, mission: MissionId },

    #[error("action offer {0} is not available in this session")]
    UnknownOffer(u32),

    #[error("unrecognized difficulty '{0}'")]
    InvalidDifficulty(String),

    #[error("invalid mission: {0}")]
    InvalidMission(String),

    /// Persistence collaborator could not be read.
    #[error("ledger read failed: {0}")]
    LedgerReadFailed(String),

    /// Persistence collaborator rejected a write.
    #[error("ledger write failed: {0}")]
    LedgerWriteFailed(String),

    #[error("mission catalog unavailable: {0}")]
    Catalog(String),
}

impl MissionError {
    /// Whether the error is caused by caller input rather than engine state.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::MissionNotFound(_)
                | Self::PlayerNotFound(_)
                | Self::UnknownOffer(_)
                | Self::InvalidDifficulty(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_context() {
        let err = MissionError::InsufficientFunds {
            required: 50,
            available: 12,
        };
        assert_eq!(
            err.to_string(),
            "insufficient $CRIME: mission costs 50, player has 12"
        );
        let err = MissionError::InvalidSessionState {
            phase: SessionPhase::Success,
            operation: "abort",
        };
        assert_eq!(err.to_string(), "cannot abort while session is success");
        assert!(!err.is_client_error());
        assert!(MissionError::MissionNotFound(MissionId(4)).is_client_error());
    }
}
