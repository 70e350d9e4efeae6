//! Engine lifecycle and the evaluation contract.
//!
//! [`EngineAdapter`] is the only owner of the engine session. Every request
//! goes through one guarded path: a request is only sent from the `Ready`
//! state, and any failure moves the session to `Crashed`. Callers never see
//! an engine error, only an empty answer.
//!
//! ```text
//! Uninitialized --start ok--> Ready --request fails--> Crashed
//!       |                       ^                         |
//!       +----start fails--------|--------> Crashed        |
//!                               +------recover ok---------+
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chess_ledger::PositionOracle;
use tracing::{debug, info, warn};
use uci::SearchReport;

use crate::engine::{AnalysisEngine, EngineError, EnginePreset, EngineSettings};
use crate::evaluation::Evaluation;

/// Executable name resolved through the system search path.
pub const SYSTEM_ENGINE: &str = "stockfish";

/// File name of an engine shipped next to the helper binary.
#[cfg(windows)]
pub const BUNDLED_ENGINE: &str = "stockfish.exe";
#[cfg(not(windows))]
pub const BUNDLED_ENGINE: &str = "stockfish";

/// A running engine the adapter can talk to.
pub trait AnalysisBackend {
    fn name(&self) -> &str;

    /// Cheap round trip (`isready`/`readyok`).
    fn ping(&mut self) -> Result<(), EngineError>;

    fn configure(&mut self, settings: &EngineSettings) -> Result<(), EngineError>;

    /// Search `fen`, reporting up to `lines` best lines.
    fn search(&mut self, fen: &str, lines: u32) -> Result<SearchReport, EngineError>;

    fn new_game(&mut self) -> Result<(), EngineError>;
}

/// Starts backends.
pub trait EngineLauncher {
    type Backend: AnalysisBackend;

    fn launch(&self, program: &Path) -> Result<Self::Backend, EngineError>;
}

/// Launches engines as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl EngineLauncher for ProcessLauncher {
    type Backend = AnalysisEngine;

    fn launch(&self, program: &Path) -> Result<AnalysisEngine, EngineError> {
        AnalysisEngine::spawn(program)
    }
}

/// Where to look for an engine executable.
#[derive(Debug, Clone, Default)]
pub struct EngineLocator {
    configured: Option<PathBuf>,
    bundled_dir: Option<PathBuf>,
}

impl EngineLocator {
    /// Look in `configured`, then next to the running executable, then on
    /// the system path.
    pub fn new(configured: Option<PathBuf>) -> Self {
        let bundled_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self {
            configured,
            bundled_dir,
        }
    }

    /// Use `dir` instead of the executable's directory for the bundled engine.
    pub fn with_bundled_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundled_dir = Some(dir.into());
        self
    }

    pub fn configured(&self) -> Option<&Path> {
        self.configured.as_deref()
    }

    /// Startup candidates in order. Filesystem paths are only offered when
    /// they exist; the system name is always last.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = self.configured.as_ref().filter(|p| p.exists()) {
            candidates.push(path.clone());
        }
        if let Some(bundled) = self
            .bundled_dir
            .as_ref()
            .map(|dir| dir.join(BUNDLED_ENGINE))
            .filter(|p| p.exists())
        {
            if !candidates.contains(&bundled) {
                candidates.push(bundled);
            }
        }
        candidates.push(PathBuf::from(SYSTEM_ENGINE));
        candidates
    }
}

/// Engine session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Crashed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "not started"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Crashed => write!(f, "crashed"),
        }
    }
}

/// Snapshot of the adapter for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    pub state: SessionState,
    pub path: Option<PathBuf>,
    pub name: Option<String>,
    pub settings: EngineSettings,
}

impl EngineStatus {
    pub fn is_available(&self) -> bool {
        self.state == SessionState::Ready
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine: {}", self.state)?;
        if let Some(name) = &self.name {
            writeln!(f, "Name: {}", name)?;
        }
        if let Some(path) = &self.path {
            writeln!(f, "Path: {}", path.display())?;
        }
        writeln!(f, "Depth: {}", self.settings.depth)?;
        match self.settings.time_budget {
            Some(budget) => writeln!(f, "Time per query: {} ms", budget.as_millis())?,
            None => writeln!(f, "Time per query: unlimited")?,
        }
        write!(f, "Skill level: {}", self.settings.skill_level)
    }
}

/// Best move, evaluation and alternatives for one position, in SAN.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionAnalysis {
    pub best_move: Option<String>,
    pub evaluation: Option<Evaluation>,
    /// Every reported line, best first; the first entry is the best move.
    pub lines: Vec<(String, Option<Evaluation>)>,
}

impl fmt::Display for PositionAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = Vec::new();
        if let Some(best) = &self.best_move {
            out.push(format!("Best move: {}", best));
        }
        if let Some(eval) = self.evaluation {
            out.push(format!("Evaluation: {}", eval));
        }
        if self.lines.len() > 1 {
            out.push("\nAlternative moves:".to_string());
            for (i, (san, eval)) in self.lines.iter().enumerate().skip(1) {
                match eval {
                    Some(eval) => out.push(format!("  {}. {} ({})", i + 1, san, eval)),
                    None => out.push(format!("  {}. {}", i + 1, san)),
                }
            }
        }
        if out.is_empty() {
            out.push("No analysis available.".to_string());
        }
        write!(f, "{}", out.join("\n"))
    }
}

/// Engine lifecycle manager and evaluation front end.
pub struct EngineAdapter<O: PositionOracle, L: EngineLauncher = ProcessLauncher> {
    oracle: O,
    launcher: L,
    locator: EngineLocator,
    settings: EngineSettings,
    state: SessionState,
    backend: Option<L::Backend>,
    path: Option<PathBuf>,
}

impl<O: PositionOracle> EngineAdapter<O, ProcessLauncher> {
    /// Adapter for a real engine process. Nothing is started until first use.
    pub fn new(oracle: O, locator: EngineLocator, settings: EngineSettings) -> Self {
        Self::with_launcher(oracle, ProcessLauncher, locator, settings)
    }
}

impl<O: PositionOracle, L: EngineLauncher> EngineAdapter<O, L> {
    pub fn with_launcher(
        oracle: O,
        launcher: L,
        locator: EngineLocator,
        settings: EngineSettings,
    ) -> Self {
        Self {
            oracle,
            launcher,
            locator,
            settings,
            state: SessionState::Uninitialized,
            backend: None,
            path: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            path: self.path.clone(),
            name: self.backend.as_ref().map(|b| b.name().to_string()),
            settings: self.settings.clone(),
        }
    }

    /// Probe the engine. Starts it on first use; any failure marks the
    /// session crashed.
    pub fn is_available(&mut self) -> bool {
        self.guarded("ping", |backend| backend.ping()).is_some()
    }

    /// Restart a crashed or never-started engine from the first candidate
    /// path that works. Returns whether the session is now ready.
    pub fn recover(&mut self) -> bool {
        if self.state == SessionState::Ready {
            return true;
        }
        info!("Attempting to recover analysis engine");
        self.start();
        self.state == SessionState::Ready
    }

    /// Best move for `position`, or `None` if the engine is unavailable or
    /// the position has no legal move.
    pub fn best_move(&mut self, position: &O::Position) -> Option<O::Move> {
        let fen = self.oracle.to_fen(position);
        let report = self.guarded("best_move", |backend| backend.search(&fen, 1))?;
        let text = report.best_move?;
        self.resolve_move(position, &text)
    }

    /// Evaluation of `position` from White's point of view.
    pub fn evaluate(&mut self, position: &O::Position) -> Option<Evaluation> {
        let fen = self.oracle.to_fen(position);
        let side = self.oracle.side_to_move(position);
        self.guarded("evaluate", |backend| {
            let report = backend.search(&fen, 1)?;
            report
                .principal()
                .and_then(|line| line.score)
                .map(|score| Evaluation::from_uci_score(score, side))
                .ok_or(EngineError::MissingScore)
        })
    }

    /// Up to `k` best moves, best first, each with its evaluation when the
    /// engine reported one. Empty on any failure.
    pub fn top_moves(
        &mut self,
        position: &O::Position,
        k: usize,
    ) -> Vec<(O::Move, Option<Evaluation>)> {
        if k == 0 {
            return Vec::new();
        }
        let fen = self.oracle.to_fen(position);
        let side = self.oracle.side_to_move(position);
        let lines = u32::try_from(k).unwrap_or(u32::MAX);
        let Some(report) = self.guarded("top_moves", |backend| backend.search(&fen, lines)) else {
            return Vec::new();
        };

        let mut moves = Vec::new();
        for line in report.lines.iter().take(k) {
            let Some(first) = line.pv.first() else {
                continue;
            };
            let Some(mv) = self.resolve_move(position, first) else {
                return Vec::new();
            };
            let eval = line.score.map(|s| Evaluation::from_uci_score(s, side));
            moves.push((mv, eval));
        }
        moves
    }

    /// Best move, evaluation and `k` lines for `position`, rendered in SAN.
    pub fn analyze_position(
        &mut self,
        position: &O::Position,
        k: usize,
    ) -> Option<PositionAnalysis> {
        let lines = self.top_moves(position, k.max(1));
        if self.state != SessionState::Ready {
            return None;
        }
        let lines: Vec<(String, Option<Evaluation>)> = lines
            .into_iter()
            .map(|(mv, eval)| (self.oracle.to_san(position, &mv), eval))
            .collect();
        Some(PositionAnalysis {
            best_move: lines.first().map(|(san, _)| san.clone()),
            evaluation: lines.first().and_then(|(_, eval)| *eval),
            lines,
        })
    }

    /// Replace the settings, pushing them to a running engine.
    pub fn reconfigure(&mut self, settings: EngineSettings) {
        self.settings = settings;
        if self.state == SessionState::Ready {
            let settings = self.settings.clone();
            self.guarded("configure", |backend| backend.configure(&settings));
        }
    }

    pub fn apply_preset(&mut self, preset: EnginePreset) {
        self.reconfigure(self.settings.clone().with_preset(preset));
    }

    /// Set the skill level, clamped to 0-20.
    pub fn set_skill_level(&mut self, level: i64) {
        self.reconfigure(self.settings.clone().with_skill_level(level));
    }

    /// Tell a running engine that a new game starts.
    pub fn new_game(&mut self) {
        if self.state == SessionState::Ready {
            self.guarded("new_game", |backend| backend.new_game());
        }
    }

    pub fn locator(&self) -> &EngineLocator {
        &self.locator
    }

    /// Change where engines are looked for. A running engine is kept; the
    /// new locator is used by the next startup or recovery.
    pub fn set_locator(&mut self, locator: EngineLocator) {
        self.locator = locator;
    }

    /// The single request path. Starts the engine lazily, refuses to talk
    /// to a crashed one, and marks the session crashed on failure.
    fn guarded<T>(
        &mut self,
        operation: &'static str,
        request: impl FnOnce(&mut L::Backend) -> Result<T, EngineError>,
    ) -> Option<T> {
        if self.state == SessionState::Uninitialized {
            self.start();
        }
        if self.state != SessionState::Ready {
            return None;
        }
        let backend = self.backend.as_mut()?;
        match request(backend) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(operation, error = %e, "Engine request failed, marking engine crashed");
                self.crash();
                None
            }
        }
    }

    /// Map engine move text onto the position; an unusable move is a failure.
    fn resolve_move(&mut self, position: &O::Position, text: &str) -> Option<O::Move> {
        match self.oracle.parse_uci(position, text) {
            Ok(mv) => Some(mv),
            Err(_) => {
                let e = EngineError::IllegalMove(text.to_string());
                warn!(error = %e, "Engine answer rejected, marking engine crashed");
                self.crash();
                None
            }
        }
    }

    fn crash(&mut self) {
        self.backend = None;
        self.state = SessionState::Crashed;
    }

    fn start(&mut self) {
        self.backend = None;
        for candidate in self.locator.candidates() {
            match self.launch(&candidate) {
                Ok(backend) => {
                    info!(path = %candidate.display(), engine = backend.name(), "Analysis engine ready");
                    self.backend = Some(backend);
                    self.path = Some(candidate);
                    self.state = SessionState::Ready;
                    return;
                }
                Err(e) => debug!(path = %candidate.display(), error = %e, "Engine candidate failed"),
            }
        }
        warn!("Could not start an analysis engine; install Stockfish or set its path");
        self.state = SessionState::Crashed;
    }

    fn launch(&self, program: &Path) -> Result<L::Backend, EngineError> {
        let mut backend = self.launcher.launch(program)?;
        backend.configure(&self.settings)?;
        Ok(backend)
    }
}
