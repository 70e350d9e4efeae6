//! One interactive game: the ledger, the engine adapter and auto-save.
//!
//! Every ledger mutation goes through [`HelperSession`] so that auto-save
//! runs after each of them.

use std::fmt;
use std::path::{Path, PathBuf};

use chess_analysis::{
    classify_game, game_statistics, AnalyzerError, EngineAdapter, EngineLauncher, EnginePreset,
    EngineStatus, Evaluation, GameStatistics, PositionAnalysis, ProcessLauncher, QualityReport,
};
use chess_ledger::{GameOutcome, LedgerError, MoveLedger, PositionOracle, Side, StandardOracle};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};

use crate::autosave::AutoSave;
use crate::config::{ConfigError, HelperConfig};
use crate::pgn::{self, ExportError, PgnHeaders};
use crate::report;

/// What happened after a move was played.
#[derive(Debug)]
pub struct MoveOutcome {
    pub san: String,
    pub outcome: GameOutcome,
    /// Engine analysis of the new position, when auto-analysis is on and the
    /// engine answered.
    pub analysis: Option<PositionAnalysis>,
    /// Path written by auto-save, or the reason it failed.
    pub autosave: Result<Option<PathBuf>, ExportError>,
}

/// Snapshot of the current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionInfo {
    pub side_to_move: Side,
    pub move_number: usize,
    pub is_check: bool,
    pub legal_moves: usize,
    pub outcome: GameOutcome,
    pub fen: String,
}

impl fmt::Display for PositionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", board_diagram(&self.fen))?;
        writeln!(f, "To move: {}", self.side_to_move)?;
        writeln!(f, "Move #{}", self.move_number)?;
        writeln!(f, "Legal moves: {}", self.legal_moves)?;
        if self.is_check && self.outcome == GameOutcome::InProgress {
            writeln!(f, "CHECK!")?;
        }
        if self.outcome != GameOutcome::InProgress {
            writeln!(f, "Game over: {}", self.outcome)?;
        }
        write!(f, "FEN: {}", self.fen)
    }
}

const FILES: &str = "  a b c d e f g h";

/// Text diagram of the piece placement in `fen`, White at the bottom.
/// Empty squares are dots; pieces use their FEN letters.
pub fn board_diagram(fen: &str) -> String {
    let placement = fen.split_whitespace().next().unwrap_or_default();
    let mut lines = vec![FILES.to_string()];
    for (i, rank) in placement.split('/').enumerate() {
        let label = 8 - i;
        let mut squares = Vec::with_capacity(8);
        for c in rank.chars() {
            match c.to_digit(10) {
                Some(empty) => (0..empty).for_each(|_| squares.push(".".to_string())),
                None => squares.push(c.to_string()),
            }
        }
        lines.push(format!("{} {} {}", label, squares.join(" "), label));
    }
    lines.push(FILES.to_string());
    lines.join("\n")
}

/// Everything `analyze --json` prints.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub moves: Vec<String>,
    pub result: &'static str,
    pub fen: String,
    pub statistics: GameStatistics,
    /// `None` when the engine was unavailable.
    pub quality: Option<QualityReport>,
}

/// A game in progress with engine assistance.
pub struct HelperSession<L: EngineLauncher = ProcessLauncher> {
    ledger: MoveLedger<StandardOracle>,
    adapter: EngineAdapter<StandardOracle, L>,
    autosave: AutoSave,
    headers: PgnHeaders,
    config: HelperConfig,
}

impl HelperSession<ProcessLauncher> {
    /// Session with a real engine process, started on first use.
    pub fn new(config: HelperConfig) -> Self {
        Self::with_launcher(config, ProcessLauncher)
    }
}

impl<L: EngineLauncher> HelperSession<L> {
    pub fn with_launcher(config: HelperConfig, launcher: L) -> Self {
        let adapter = EngineAdapter::with_launcher(
            StandardOracle,
            launcher,
            config.engine.locator(),
            config.engine.settings(),
        );
        Self {
            ledger: MoveLedger::new(StandardOracle),
            adapter,
            autosave: AutoSave::from_config(&config.game),
            headers: PgnHeaders::from_config(&config.game),
            config,
        }
    }

    pub fn ledger(&self) -> &MoveLedger<StandardOracle> {
        &self.ledger
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    pub fn headers(&self) -> &PgnHeaders {
        &self.headers
    }

    pub fn auto_analysis(&self) -> bool {
        self.config.game.auto_analysis
    }

    /// Flip auto-analysis and return the new setting.
    pub fn toggle_analysis(&mut self) -> bool {
        self.config.game.auto_analysis = !self.config.game.auto_analysis;
        self.config.game.auto_analysis
    }

    /// Play a move given in SAN or coordinate notation.
    ///
    /// # Errors
    ///
    /// The ledger's parse, illegal and ambiguous errors. Nothing changes on
    /// error.
    pub fn play(&mut self, text: &str) -> Result<MoveOutcome, LedgerError> {
        let san = self.ledger.apply(text)?;
        let autosave = self.autosave.check(&self.ledger, &self.headers);
        let outcome = self.ledger.result();
        let analysis = if self.auto_analysis() && outcome == GameOutcome::InProgress {
            self.analysis()
        } else {
            None
        };
        Ok(MoveOutcome {
            san,
            outcome,
            analysis,
            autosave,
        })
    }

    /// Take back the last move, returning its SAN and the auto-save result.
    pub fn undo(
        &mut self,
    ) -> Result<(String, Result<Option<PathBuf>, ExportError>), LedgerError> {
        let san = self
            .ledger
            .history_as_text()
            .pop()
            .ok_or(LedgerError::Empty)?;
        self.ledger.undo()?;
        let autosave = self.autosave.check(&self.ledger, &self.headers);
        Ok((san, autosave))
    }

    /// Start a new game.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.autosave.reset();
        self.adapter.new_game();
        info!("New game started");
    }

    pub fn position_info(&self) -> PositionInfo {
        PositionInfo {
            side_to_move: self.ledger.side_to_move(),
            move_number: self.ledger.move_number(),
            is_check: self.ledger.is_check(),
            legal_moves: self
                .ledger
                .oracle()
                .legal_moves(self.ledger.position())
                .len(),
            outcome: self.ledger.result(),
            fen: self.ledger.fen(),
        }
    }

    /// Engine view of the current position: best move, evaluation and the
    /// configured number of alternatives. `None` once the game is over or
    /// when the engine is unavailable.
    pub fn analysis(&mut self) -> Option<PositionAnalysis> {
        if self.ledger.is_terminal() {
            return None;
        }
        let k = self.config.engine.alternatives;
        self.adapter.analyze_position(self.ledger.position(), k)
    }

    /// The engine's best move in SAN.
    pub fn hint(&mut self) -> Option<String> {
        let position = self.ledger.position();
        let mv = self.adapter.best_move(position)?;
        Some(self.ledger.oracle().to_san(position, &mv))
    }

    pub fn evaluation(&mut self) -> Option<Evaluation> {
        self.adapter.evaluate(self.ledger.position())
    }

    pub fn statistics(&self) -> GameStatistics {
        game_statistics(&self.ledger)
    }

    /// Classify every move played so far.
    pub fn quality(&mut self) -> Result<QualityReport, AnalyzerError> {
        classify_game(&self.ledger, &mut self.adapter)
    }

    /// Statistics and, when the engine is available, move quality.
    pub fn summary(&mut self) -> AnalysisSummary {
        let quality = self.quality().ok();
        AnalysisSummary {
            moves: self.ledger.history_as_text(),
            result: self.ledger.result().pgn_token(),
            fen: self.ledger.fen(),
            statistics: self.statistics(),
            quality,
        }
    }

    /// The full text report.
    pub fn report(&mut self) -> String {
        let quality = self.quality();
        if let Err(e) = &quality {
            debug!(error = %e, "Report without move quality");
        }
        report::to_report(&self.ledger, &self.statistics(), quality.as_ref().ok())
    }

    pub fn pgn(&self) -> String {
        pgn::to_pgn(&self.ledger, &self.headers)
    }

    /// Save the game as PGN to `path`, or to a timestamped file in the
    /// working directory.
    pub fn save_pgn(&self, path: Option<&Path>) -> Result<PathBuf, ExportError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(format!(
                "chess_game_{}.pgn",
                Local::now().format("%Y%m%d_%H%M%S")
            )),
        };
        pgn::write_pgn(&path, &self.ledger, &self.headers)?;
        info!(path = %path.display(), "Game saved");
        Ok(path)
    }

    /// Write the analysis report to `path`, or to the default report file
    /// name in the working directory.
    pub fn save_report(&mut self, path: Option<&Path>) -> Result<PathBuf, ExportError> {
        let text = self.report();
        match path {
            Some(path) => report::write_report(path, &text).map(|()| path.to_path_buf()),
            None => report::write_report_in(Path::new("."), &text),
        }
    }

    pub fn engine_status(&self) -> EngineStatus {
        self.adapter.status()
    }

    pub fn engine_available(&mut self) -> bool {
        self.adapter.is_available()
    }

    pub fn recover_engine(&mut self) -> bool {
        self.adapter.recover()
    }

    pub fn apply_preset(&mut self, preset: EnginePreset) {
        self.adapter.apply_preset(preset);
        let settings = self.adapter.settings();
        self.config.engine.depth = settings.depth;
        self.config.engine.time_budget_ms = settings
            .time_budget
            .map_or(0, |budget| budget.as_millis() as u64);
    }

    /// Change one configuration value and apply it to the running session.
    ///
    /// Engine search settings take effect immediately, a new engine path on
    /// the next engine restart, and `log_level` on the next program start.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.config.set(key, value)?;
        match key.split_once('.').map(|(section, _)| section) {
            Some("engine") if key == "engine.path" => {
                self.adapter.set_locator(self.config.engine.locator());
            }
            Some("engine") => self.adapter.reconfigure(self.config.engine.settings()),
            Some("game") => {
                self.autosave.reconfigure(&self.config.game);
                self.headers = PgnHeaders::from_config(&self.config.game);
            }
            _ => {}
        }
        Ok(())
    }
}
