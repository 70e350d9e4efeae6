//! GUI-side UCI conversation over any line-oriented reader/writer pair.
//!
//! [`UciClient`] owns nothing but the two pipe ends, so the same code talks
//! to a spawned engine process and to an in-memory transcript in tests.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::{EngineInfo, EngineMessage, GoOptions, GuiCommand, UciError};

/// Maximum number of lines to read before giving up on a UCI response.
pub const MAX_UCI_LINES: usize = 10_000;

/// Outcome of one `go` request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchReport {
    /// Best move in coordinate notation, `None` when the engine answered `(none)`.
    pub best_move: Option<String>,
    /// Move the engine expects in reply.
    pub ponder: Option<String>,
    /// Latest info per line rank, best line first.
    pub lines: Vec<EngineInfo>,
}

impl SearchReport {
    /// The principal line, if the engine reported one.
    pub fn principal(&self) -> Option<&EngineInfo> {
        self.lines.first()
    }
}

/// A UCI conversation with an engine.
pub struct UciClient<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    name: String,
}

impl<R: BufRead, W: Write> UciClient<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            name: String::new(),
        }
    }

    /// The engine's name as reported during the handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send a command to the engine.
    pub fn send(&mut self, cmd: &GuiCommand) -> Result<(), UciError> {
        writeln!(self.writer, "{}", cmd.to_uci())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read and parse the next message. A closed pipe is an error.
    pub fn read_message(&mut self) -> Result<EngineMessage, UciError> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)?;
        if bytes == 0 {
            return Err(UciError::Closed);
        }
        Ok(EngineMessage::parse(&line))
    }

    /// Send `uci` and wait for `uciok`, capturing the engine name.
    pub fn handshake(&mut self) -> Result<(), UciError> {
        self.send(&GuiCommand::Uci)?;

        let mut name = None;
        self.read_until("uciok", |msg| match msg {
            EngineMessage::Id { name: Some(n), .. } => {
                name = Some(n.clone());
                false
            }
            EngineMessage::UciOk => true,
            _ => false,
        })?;

        self.name = name.unwrap_or_else(|| "Unknown Engine".to_string());
        Ok(())
    }

    /// Send `isready` and wait for `readyok`.
    pub fn sync(&mut self) -> Result<(), UciError> {
        self.send(&GuiCommand::IsReady)?;
        self.read_until("readyok", |msg| *msg == EngineMessage::ReadyOk)
    }

    /// Set an engine option.
    pub fn set_option(&mut self, name: &str, value: impl ToString) -> Result<(), UciError> {
        self.send(&GuiCommand::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Search the position given in FEN and collect every reported line.
    pub fn search(&mut self, fen: &str, options: GoOptions) -> Result<SearchReport, UciError> {
        self.send(&GuiCommand::Position {
            fen: fen.to_string(),
        })?;
        self.send(&GuiCommand::Go(options))?;

        let mut lines: BTreeMap<u32, EngineInfo> = BTreeMap::new();
        for _ in 0..MAX_UCI_LINES {
            match self.read_message()? {
                EngineMessage::Info(info) => {
                    // Only lines carrying a score describe a searched variation.
                    if info.score.is_some() {
                        lines.insert(info.rank(), info);
                    }
                }
                EngineMessage::BestMove { mv, ponder } => {
                    return Ok(SearchReport {
                        best_move: mv,
                        ponder,
                        lines: lines.into_values().collect(),
                    });
                }
                _ => {}
            }
        }

        Err(UciError::NoTerminator("bestmove"))
    }

    fn read_until<F>(&mut self, expected: &'static str, mut done: F) -> Result<(), UciError>
    where
        F: FnMut(&EngineMessage) -> bool,
    {
        for _ in 0..MAX_UCI_LINES {
            let msg = self.read_message()?;
            if done(&msg) {
                return Ok(());
            }
        }
        Err(UciError::NoTerminator(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Score;
    use std::io::Cursor;

    fn client(transcript: &str) -> UciClient<Cursor<Vec<u8>>, Vec<u8>> {
        UciClient::new(Cursor::new(transcript.as_bytes().to_vec()), Vec::new())
    }

    fn written(client: &UciClient<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(client.writer.clone()).unwrap()
    }

    #[test]
    fn handshake_reads_name() {
        let mut c = client("id name Stockfish 16\nid author the team\noption name Hash\nuciok\n");
        c.handshake().unwrap();
        assert_eq!(c.name(), "Stockfish 16");
        assert_eq!(written(&c), "uci\n");
    }

    #[test]
    fn handshake_without_name() {
        let mut c = client("uciok\n");
        c.handshake().unwrap();
        assert_eq!(c.name(), "Unknown Engine");
    }

    #[test]
    fn handshake_on_closed_pipe_fails() {
        let mut c = client("id name Half\n");
        assert!(matches!(c.handshake(), Err(UciError::Closed)));
    }

    #[test]
    fn sync_waits_for_readyok() {
        let mut c = client("info string warming up\nreadyok\n");
        c.sync().unwrap();
        assert_eq!(written(&c), "isready\n");
    }

    #[test]
    fn search_collects_latest_line_per_rank() {
        let transcript = "\
info depth 1 multipv 1 score cp 10 pv d2d4
info depth 1 multipv 2 score cp 5 pv e2e4
info depth 2 multipv 1 score cp 31 pv e2e4 e7e5
info depth 2 multipv 2 score cp 22 pv d2d4
info depth 2 currmove g1f3 currmovenumber 3
bestmove e2e4 ponder e7e5
";
        let mut c = client(transcript);

        let report = c
            .search("8/8/8/8/8/8/8/K6k w - - 0 1", GoOptions::depth(2))
            .unwrap();

        assert_eq!(report.best_move.as_deref(), Some("e2e4"));
        assert_eq!(report.ponder.as_deref(), Some("e7e5"));
        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.lines[0].score, Some(Score::Cp(31)));
        assert_eq!(report.lines[1].pv, vec!["d2d4"]);
        assert_eq!(
            written(&c),
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1\ngo depth 2\n"
        );
    }

    #[test]
    fn search_with_no_legal_moves() {
        let mut c = client("info depth 0 score mate 0\nbestmove (none)\n");
        let report = c
            .search("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1", GoOptions::depth(10))
            .unwrap();
        assert!(report.best_move.is_none());
        assert_eq!(report.principal().unwrap().score, Some(Score::Mate(0)));
    }

    #[test]
    fn search_without_bestmove_fails() {
        let mut c = client("info depth 1 score cp 3 pv e2e4\n");
        let result = c.search("8/8/8/8/8/8/8/K6k w - - 0 1", GoOptions::depth(1));
        assert!(matches!(result, Err(UciError::Closed)));
    }

    #[test]
    fn set_option_is_formatted() {
        let mut c = client("");
        c.set_option("MultiPV", 3).unwrap();
        assert_eq!(written(&c), "setoption name MultiPV value 3\n");
    }
}
