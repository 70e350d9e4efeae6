//! Stockfish engine process wrapper.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uci::{GoOptions, GuiCommand, SearchReport, UciClient, UciError};

use crate::adapter::AnalysisBackend;

/// Strongest skill level an engine accepts.
pub const MAX_SKILL_LEVEL: u8 = 20;

/// Errors that can occur when working with chess engines.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to spawn the engine process.
    #[error("Failed to spawn engine: {0}")]
    SpawnError(#[from] std::io::Error),
    /// Engine executable was not found at the specified path.
    #[error("Engine not found at path: {}", .0.display())]
    NotFound(PathBuf),
    /// Engine pipes could not be attached.
    #[error("Engine initialization failed")]
    InitFailed,
    /// The UCI conversation broke down.
    #[error("UCI error: {0}")]
    Uci(#[from] UciError),
    /// A search finished without a scored line.
    #[error("Engine reported no score")]
    MissingScore,
    /// The engine suggested a move the position does not allow.
    #[error("Engine suggested an illegal move: {0}")]
    IllegalMove(String),
}

/// Search effort settings. They never change what is analyzed, only how hard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Maximum search depth in plies.
    pub depth: u32,
    /// Wall-clock budget per query.
    pub time_budget: Option<Duration>,
    /// Playing strength, 0 (weakest) to 20.
    pub skill_level: u8,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            depth: 15,
            time_budget: Some(Duration::from_secs(1)),
            skill_level: MAX_SKILL_LEVEL,
        }
    }
}

/// Canned effort levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePreset {
    /// Quick answers while a game is being played.
    Live,
    /// Thorough post-game analysis.
    Deep,
}

impl EngineSettings {
    /// Same settings with the preset's depth and time budget.
    pub fn with_preset(self, preset: EnginePreset) -> Self {
        let (depth, budget) = match preset {
            EnginePreset::Live => (10, Duration::from_millis(500)),
            EnginePreset::Deep => (20, Duration::from_secs(3)),
        };
        Self {
            depth,
            time_budget: Some(budget),
            ..self
        }
    }

    /// Same settings with the skill level clamped to 0-20.
    pub fn with_skill_level(self, level: i64) -> Self {
        Self {
            skill_level: level.clamp(0, i64::from(MAX_SKILL_LEVEL)) as u8,
            ..self
        }
    }

    /// The `go` options these settings translate to.
    pub fn go_options(&self) -> GoOptions {
        let go = GoOptions::depth(self.depth);
        match self.time_budget {
            Some(budget) => go.with_movetime(budget.as_millis() as u64),
            None => go,
        }
    }
}

/// A UCI analysis engine running as a child process.
pub struct AnalysisEngine {
    process: Child,
    client: UciClient<BufReader<ChildStdout>, ChildStdin>,
    settings: EngineSettings,
    multipv: u32,
}

impl AnalysisEngine {
    /// Spawn the engine and complete the UCI handshake.
    ///
    /// # Errors
    ///
    /// - `EngineError::SpawnError` if the process fails to start
    /// - `EngineError::Uci` if the handshake breaks down
    pub fn spawn(program: &Path) -> Result<Self, EngineError> {
        let mut process = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = process.stdin.take().ok_or(EngineError::InitFailed)?;
        let stdout = process.stdout.take().ok_or(EngineError::InitFailed)?;

        let mut engine = Self {
            process,
            client: UciClient::new(BufReader::new(stdout), stdin),
            settings: EngineSettings::default(),
            multipv: 1,
        };

        engine.client.handshake()?;
        engine.client.sync()?;
        info!(engine = engine.client.name(), path = %program.display(), "Engine started");

        Ok(engine)
    }
}

impl AnalysisBackend for AnalysisEngine {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn ping(&mut self) -> Result<(), EngineError> {
        self.client.sync()?;
        Ok(())
    }

    fn configure(&mut self, settings: &EngineSettings) -> Result<(), EngineError> {
        self.client.set_option("Skill Level", settings.skill_level)?;
        self.client.sync()?;
        self.settings = settings.clone();
        Ok(())
    }

    fn search(&mut self, fen: &str, lines: u32) -> Result<SearchReport, EngineError> {
        let lines = lines.max(1);
        if lines != self.multipv {
            self.client.set_option("MultiPV", lines)?;
            self.multipv = lines;
        }
        let report = self.client.search(fen, self.settings.go_options())?;
        debug!(fen, lines = report.lines.len(), best = ?report.best_move, "Search finished");
        Ok(report)
    }

    /// Clears the engine's hash tables.
    fn new_game(&mut self) -> Result<(), EngineError> {
        self.client.send(&GuiCommand::UciNewGame)?;
        self.client.sync()?;
        Ok(())
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        // The engine may already be gone; nothing useful to do on failure.
        let _ = self.client.send(&GuiCommand::Quit);
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}
