//! Game error types

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::EntityKind;

/// Errors raised by the game core and its runtime
#[derive(Debug, Error)]
pub enum GameError {
    /// Font or audio file missing or unreadable
    #[error("failed to load asset {path}: {source}")]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Single-entity query on an empty group
    #[error("no live {kind:?} entity")]
    EmptyQuery { kind: EntityKind },

    /// Handle used after the registry compacted or cleared
    #[error("stale {kind:?} handle from epoch {handle_epoch} (registry is at epoch {current_epoch})")]
    StaleHandle {
        kind: EntityKind,
        handle_epoch: u64,
        current_epoch: u64,
    },

    /// Registry bookkeeping mismatch
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A runtime worker went away
    #[error("{0} worker disconnected")]
    WorkerDisconnected(&'static str),

    /// The OS refused to start a runtime worker
    #[error("failed to spawn {name} worker: {source}")]
    WorkerSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Settings file could not be read
    #[error("failed to read settings {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings document is malformed
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl GameError {
    /// Whether the frame loop may log this error and carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::EmptyQuery { .. }
                | GameError::StaleHandle { .. }
                | GameError::InvariantViolation(_)
        )
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(GameError::EmptyQuery { kind: EntityKind::Ball }.is_recoverable());
        assert!(GameError::InvariantViolation("x".into()).is_recoverable());
        assert!(
            GameError::StaleHandle {
                kind: EntityKind::Brick,
                handle_epoch: 1,
                current_epoch: 2,
            }
            .is_recoverable()
        );
        assert!(!GameError::WorkerDisconnected("simulation").is_recoverable());

        let missing = GameError::AssetLoad {
            path: PathBuf::from("missing.ttf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!missing.is_recoverable());
        assert!(missing.to_string().contains("missing.ttf"));
    }
}
