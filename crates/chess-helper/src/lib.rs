//! Chess Helper - an over-the-board chess companion.
//!
//! Tracks the moves of a game played on a physical board, asks a UCI engine
//! for hints and evaluations, and exports the game as PGN and as an
//! analysis report.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration file
//! - [`session`] - One game with its engine and auto-save
//! - [`command`] - Interactive command parsing and dispatch
//! - [`pgn`] - PGN rendering and export
//! - [`report`] - Plain-text analysis report
//! - [`autosave`] - Move-count driven auto-save

pub mod autosave;
pub mod command;
pub mod config;
pub mod pgn;
pub mod report;
pub mod session;

pub use autosave::AutoSave;
pub use command::{execute, Command, CommandError, Flow};
pub use config::{ConfigError, HelperConfig};
pub use pgn::{to_pgn, write_pgn, ExportError, PgnHeaders};
pub use report::{to_report, write_report};
pub use session::{AnalysisSummary, HelperSession, MoveOutcome, PositionInfo};
