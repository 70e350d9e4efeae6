//! Engine-assisted chess game analysis.
//!
//! This crate turns a [`MoveLedger`](chess_ledger::MoveLedger) and a UCI
//! engine into move quality data.
//!
//! # Overview
//!
//! - [`Evaluation`] - Position evaluation (centipawns or forced mate)
//! - [`EngineAdapter`] - Engine lifecycle: lazy startup, crash detection, recovery
//! - [`AnalysisEngine`] - Wrapper for UCI analysis engines like Stockfish
//! - [`MoveQuality`] - Tiers from excellent to blunder
//! - [`game_statistics`] - Capture, check, castle, promotion and material counts
//! - [`classify_game`] - Per-move quality for a whole game
//!
//! # Example
//!
//! ```ignore
//! use chess_analysis::{classify_game, EngineAdapter, EngineLocator, EngineSettings};
//! use chess_ledger::{MoveLedger, StandardOracle};
//!
//! let mut ledger = MoveLedger::new(StandardOracle);
//! ledger.apply("e4")?;
//! let mut adapter = EngineAdapter::new(StandardOracle, EngineLocator::new(None), EngineSettings::default());
//! let report = classify_game(&ledger, &mut adapter)?;
//! println!("Average loss: {:.2}", report.overall.average_loss());
//! ```

pub mod adapter;
pub mod analyzer;
pub mod engine;
pub mod evaluation;
pub mod quality;
pub mod statistics;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adapter::{
    AnalysisBackend, EngineAdapter, EngineLauncher, EngineLocator, EngineStatus,
    PositionAnalysis, ProcessLauncher, SessionState,
};
pub use analyzer::{classify_game, AnalyzerError};
pub use engine::{AnalysisEngine, EngineError, EnginePreset, EngineSettings};
pub use evaluation::Evaluation;
pub use quality::{MoveAssessment, MoveQuality, QualityReport, TierCounts};
pub use statistics::{game_statistics, game_statistics_at, GameStatistics, Material};
