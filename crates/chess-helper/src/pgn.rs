//! PGN (Portable Game Notation) export.
//!
//! Rendering and writing are separate steps: [`to_pgn`] is a pure function
//! of the ledger and headers, [`write_pgn`] stores the result.

use std::path::{Path, PathBuf};

use chess_ledger::{MoveLedger, PositionOracle};
use thiserror::Error;

use crate::config::GameConfig;

/// Maximum width of a move text line.
pub const LINE_WIDTH: usize = 80;

/// A file could not be written. The game itself is untouched.
#[derive(Error, Debug)]
#[error("Failed to write {}: {source}", destination.display())]
pub struct ExportError {
    /// The file that was being written.
    pub destination: PathBuf,
    pub source: std::io::Error,
}

/// Write `content` to `path`, tagging failures with the destination.
pub(crate) fn write_export(path: &Path, content: &str) -> Result<(), ExportError> {
    std::fs::write(path, content).map_err(|source| ExportError {
        destination: path.to_path_buf(),
        source,
    })
}

/// Tag pairs written above the move text. `Date` and `Result` come from the
/// ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnHeaders {
    pub event: String,
    pub site: String,
    pub round: String,
    pub white: String,
    pub black: String,
}

impl Default for PgnHeaders {
    fn default() -> Self {
        Self {
            event: "Home Game".to_string(),
            site: "Chess Helper App".to_string(),
            round: "1".to_string(),
            white: "White".to_string(),
            black: "Black".to_string(),
        }
    }
}

impl PgnHeaders {
    /// Default headers with the player names from the configuration.
    pub fn from_config(game: &GameConfig) -> Self {
        Self {
            white: game.white.clone(),
            black: game.black.clone(),
            ..Self::default()
        }
    }
}

/// Render the game as PGN.
///
/// The output is the seven tag roster, a blank line, then numbered SAN
/// move pairs ending in the result token, wrapped at [`LINE_WIDTH`]
/// columns between tokens.
pub fn to_pgn<O: PositionOracle>(ledger: &MoveLedger<O>, headers: &PgnHeaders) -> String {
    let result = ledger.result().pgn_token();
    let date = ledger.started_at().format("%Y.%m.%d").to_string();

    let mut pgn = String::new();
    for (tag, value) in [
        ("Event", headers.event.as_str()),
        ("Site", headers.site.as_str()),
        ("Date", date.as_str()),
        ("Round", headers.round.as_str()),
        ("White", headers.white.as_str()),
        ("Black", headers.black.as_str()),
        ("Result", result),
    ] {
        pgn.push_str(&format!("[{} \"{}\"]\n", tag, escape(value)));
    }
    pgn.push('\n');

    let mut tokens = Vec::new();
    for (i, san) in ledger.history_as_text().into_iter().enumerate() {
        if i % 2 == 0 {
            tokens.push(format!("{}.", i / 2 + 1));
        }
        tokens.push(san);
    }
    tokens.push(result.to_string());

    for line in wrap(&tokens, LINE_WIDTH) {
        pgn.push_str(&line);
        pgn.push('\n');
    }
    pgn
}

/// Render and write the game to `path`.
///
/// # Errors
///
/// Returns [`ExportError`] carrying `path` if the file cannot be written.
pub fn write_pgn<O: PositionOracle>(
    path: &Path,
    ledger: &MoveLedger<O>,
    headers: &PgnHeaders,
) -> Result<(), ExportError> {
    write_export(path, &to_pgn(ledger, headers))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Greedy line filling; a token is never split.
fn wrap(tokens: &[String], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(token);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
