use log::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::time::Instant;
use trackside_core::{event::EventLog, snapshot::MatchPhase, sport::Sport, team::SideBundle};

use crate::engine::MatchEngine;

pub const OFFLINE_GAME_FILE: &str = "offline-game.json";
pub const CURRENT_VERSION: u32 = 1;

/// Everything needed to pick a match back up after the app dies mid-game.
/// The `version` field gates forward compatibility: files written by a newer
/// build than this one are ignored, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineGame {
    pub version: u32,
    pub sport: Sport,
    pub opponent_name: String,
    pub phase: MatchPhase,
    /// Seconds remaining on the clock when the save was made.
    pub secs_remaining: u64,
    pub scores: SideBundle<u16>,
    pub events: EventLog,
    #[serde(with = "time::serde::iso8601")]
    pub saved_at: OffsetDateTime,
}

impl OfflineGame {
    pub fn capture(engine: &MatchEngine, now: Instant) -> Option<Self> {
        Some(Self {
            version: CURRENT_VERSION,
            sport: engine.sport(),
            opponent_name: engine.opponent_name().to_string(),
            phase: engine.phase(),
            secs_remaining: engine.game_clock_time(now)?.as_secs(),
            scores: engine.scores(),
            events: engine.events().clone(),
            saved_at: OffsetDateTime::now_utc(),
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access the save file: {0}")]
    Io(#[from] std::io::Error),
    #[error("The save file could not be read or written: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub fn offline_game_path(data_dir: &Path) -> PathBuf {
    data_dir.join(OFFLINE_GAME_FILE)
}

pub fn save(game: &OfflineGame, path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = serde_json::to_string_pretty(game)?;
    fs::write(path, serialized)?;
    info!("Saved match state to {}", path.display());
    Ok(())
}

/// Returns `Ok(None)` when there is no save, or when the save was written by
/// a newer build than this one.
pub fn load(path: &Path) -> StoreResult<Option<OfflineGame>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let game: OfflineGame = serde_json::from_str(&contents)?;
    if game.version > CURRENT_VERSION {
        warn!(
            "Ignoring save file version {} (newest supported is {})",
            game.version, CURRENT_VERSION
        );
        return Ok(None);
    }
    Ok(Some(game))
}

pub fn clear(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use trackside_core::{event::EventKind, team::TeamSide};

    fn sample_game() -> OfflineGame {
        let mut events = EventLog::new();
        events.append(
            EventKind::Goal,
            TeamSide::Us,
            "Goal".to_string(),
            MatchPhase::Period(1),
            core::time::Duration::from_secs(63),
            OffsetDateTime::UNIX_EPOCH,
            Some(10),
        );
        OfflineGame {
            version: CURRENT_VERSION,
            sport: Sport::Hockey,
            opponent_name: "Rockets".to_string(),
            phase: MatchPhase::Period(2),
            secs_remaining: 745,
            scores: SideBundle { us: 1, them: 0 },
            events,
            saved_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = offline_game_path(dir.path());

        let game = sample_game();
        save(&game, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, Some(game));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = offline_game_path(dir.path());
        assert_eq!(load(&path).unwrap(), None);
    }

    #[test]
    fn test_newer_version_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = offline_game_path(dir.path());

        let mut game = sample_game();
        game.version = CURRENT_VERSION + 1;
        save(&game, &path).unwrap();
        assert_eq!(load(&path).unwrap(), None);
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = offline_game_path(dir.path());
        fs::write(&path, "not json").unwrap();
        assert!(matches!(load(&path), Err(StoreError::Serde(_))));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = offline_game_path(dir.path());
        save(&sample_game(), &path).unwrap();
        clear(&path).unwrap();
        assert_eq!(load(&path).unwrap(), None);
        // Clearing an absent file is fine
        clear(&path).unwrap();
    }
}
