//! Move-count driven auto-save.

use std::path::{Path, PathBuf};

use chess_ledger::{MoveLedger, PositionOracle};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::pgn::{to_pgn, write_export, ExportError, PgnHeaders};

/// Saves the game as PGN every `interval` moves.
///
/// A save fires when the move count is a positive multiple of the interval
/// and differs from the count at the last successful save, so undoing and
/// replaying the same move does not save twice.
#[derive(Debug, Clone)]
pub struct AutoSave {
    enabled: bool,
    interval: usize,
    directory: PathBuf,
    last_saved: usize,
}

impl AutoSave {
    pub fn new(enabled: bool, interval: usize, directory: impl Into<PathBuf>) -> Self {
        Self {
            enabled,
            interval,
            directory: directory.into(),
            last_saved: 0,
        }
    }

    pub fn from_config(game: &GameConfig) -> Self {
        Self::new(game.auto_save, game.autosave_interval, &game.export_dir)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Move count at the last successful save, 0 if none.
    pub fn last_saved(&self) -> usize {
        self.last_saved
    }

    /// Whether a ledger with `move_count` moves should be saved now.
    pub fn is_due(&self, move_count: usize) -> bool {
        self.enabled
            && self.interval > 0
            && move_count > 0
            && move_count % self.interval == 0
            && move_count != self.last_saved
    }

    /// File name for a save of `move_count` moves at `now`.
    pub fn filename(move_count: usize, now: DateTime<Local>) -> String {
        format!(
            "autosave_{}_m{}.pgn",
            now.format("%Y%m%d_%H%M%S"),
            move_count
        )
    }

    /// Run after every ledger mutation. Saves when due and returns the path
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the directory or file cannot be written.
    /// The save stays due, so the next mutation at a qualifying count tries
    /// again.
    pub fn check<O: PositionOracle>(
        &mut self,
        ledger: &MoveLedger<O>,
        headers: &PgnHeaders,
    ) -> Result<Option<PathBuf>, ExportError> {
        let count = ledger.len();
        if !self.is_due(count) {
            return Ok(None);
        }

        let path = self.directory.join(Self::filename(count, Local::now()));
        let saved = std::fs::create_dir_all(&self.directory)
            .map_err(|source| ExportError {
                destination: self.directory.clone(),
                source,
            })
            .and_then(|()| write_export(&path, &to_pgn(ledger, headers)));

        match saved {
            Ok(()) => {
                self.last_saved = count;
                info!(path = %path.display(), moves = count, "Game auto-saved");
                Ok(Some(path))
            }
            Err(e) => {
                warn!(error = %e, moves = count, "Auto-save failed");
                Err(e)
            }
        }
    }

    /// Forget the last save, for a new game.
    pub fn reset(&mut self) {
        self.last_saved = 0;
    }

    /// Apply changed settings. The save history is kept.
    pub fn reconfigure(&mut self, game: &GameConfig) {
        self.enabled = game.auto_save;
        self.interval = game.autosave_interval;
        self.directory = game.export_dir.clone();
    }
}
