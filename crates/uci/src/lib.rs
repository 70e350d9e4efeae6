//! UCI (Universal Chess Interface) protocol library, GUI side.
//!
//! This crate provides the command and response vocabulary a GUI needs to
//! drive an analysis engine, plus [`UciClient`] which runs the conversation
//! over any reader/writer pair.
//!
//! # Commands sent
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `readyok` - Synchronization
//! - `setoption name <name> value <value>` - Configure the engine
//! - `position fen <fen>` - Set position
//! - `go [depth <d>] [movetime <ms>]` - Start search
//! - `quit` - Exit engine
//!
//! # Responses parsed
//!
//! - `id name <name>`, `uciok`, `readyok`
//! - `info ... [multipv <k>] score cp|mate <n> ... pv <moves>`
//! - `bestmove <move>|(none) [ponder <move>]`

mod client;
mod command;
mod info;

pub use client::{SearchReport, UciClient, MAX_UCI_LINES};
pub use command::{GoOptions, GuiCommand};
pub use info::{Bound, EngineInfo, Score};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Engine closed its output")]
    Closed,
    #[error("No '{0}' within {max} lines", max = MAX_UCI_LINES)]
    NoTerminator(&'static str),
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id {
        name: Option<String>,
        author: Option<String>,
    },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found; `None` when the position has no legal move.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    /// Anything else (options, copyright banners, blank lines).
    Other(String),
}

impl EngineMessage {
    /// Parse one line of engine output.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next().unwrap_or("") {
            "uciok" => EngineMessage::UciOk,
            "readyok" => EngineMessage::ReadyOk,
            "id" => match parts.next() {
                Some("name") => EngineMessage::Id {
                    name: Some(parts.collect::<Vec<_>>().join(" ")),
                    author: None,
                },
                Some("author") => EngineMessage::Id {
                    name: None,
                    author: Some(parts.collect::<Vec<_>>().join(" ")),
                },
                _ => EngineMessage::Other(line.to_string()),
            },
            "info" => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Other(line.to_string()),
            },
            "bestmove" => {
                let mv = parts
                    .next()
                    .filter(|m| *m != "(none)" && *m != "0000")
                    .map(str::to_string);
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().map(str::to_string),
                    _ => None,
                };
                EngineMessage::BestMove { mv, ponder }
            }
            _ => EngineMessage::Other(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_handshake_messages() {
        assert_eq!(EngineMessage::parse("uciok\n"), EngineMessage::UciOk);
        assert_eq!(EngineMessage::parse("readyok"), EngineMessage::ReadyOk);
        assert_eq!(
            EngineMessage::parse("id name Stockfish 16.1"),
            EngineMessage::Id {
                name: Some("Stockfish 16.1".to_string()),
                author: None
            }
        );
    }

    #[test]
    fn parse_bestmove_with_ponder() {
        assert_eq!(
            EngineMessage::parse("bestmove e2e4 ponder e7e5"),
            EngineMessage::BestMove {
                mv: Some("e2e4".to_string()),
                ponder: Some("e7e5".to_string())
            }
        );
    }

    #[test]
    fn parse_bestmove_none() {
        assert_eq!(
            EngineMessage::parse("bestmove (none)"),
            EngineMessage::BestMove {
                mv: None,
                ponder: None
            }
        );
    }

    #[test]
    fn parse_info_message() {
        match EngineMessage::parse("info depth 3 score cp -20 pv e7e5") {
            EngineMessage::Info(info) => assert_eq!(info.score, Some(Score::Cp(-20))),
            other => panic!("Expected Info, got {:?}", other),
        }
    }

    #[test]
    fn parse_unknown_line() {
        assert_eq!(
            EngineMessage::parse("Stockfish 16 by the Stockfish developers"),
            EngineMessage::Other("Stockfish 16 by the Stockfish developers".to_string())
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(UciError::Closed.to_string(), "Engine closed its output");
        assert_eq!(
            UciError::NoTerminator("bestmove").to_string(),
            "No 'bestmove' within 10000 lines"
        );
    }

    #[test]
    fn io_errors_convert() {
        fn fails() -> Result<(), UciError> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(UciError::IoError(_))));
    }
}
