//! Move history with a derived current position.
//!
//! The [`MoveLedger`] stores moves only. Text forms (SAN history, PGN move
//! text) are recomputed by replaying from the initial position, so they can
//! never drift from the moves actually applied.

use std::fmt;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

use crate::oracle::{MoveParseError, PositionOracle, Side};

/// Error type for ledger mutations. None of them change the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("cannot parse move '{0}'")]
    Parse(String),
    #[error("illegal move '{0}'")]
    IllegalMove(String),
    #[error("ambiguous move '{0}', add the origin file or rank")]
    Ambiguous(String),
    #[error("no moves to undo")]
    Empty,
}

impl From<MoveParseError> for LedgerError {
    fn from(e: MoveParseError) -> Self {
        match e {
            MoveParseError::Malformed(s) => LedgerError::Parse(s),
            MoveParseError::Illegal(s) => LedgerError::IllegalMove(s),
            MoveParseError::Ambiguous(s) => LedgerError::Ambiguous(s),
        }
    }
}

/// Game outcome as seen from the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    WhiteWin,
    BlackWin,
    Draw,
    InProgress,
}

impl GameOutcome {
    /// The PGN result token.
    pub fn pgn_token(self) -> &'static str {
        match self {
            GameOutcome::WhiteWin => "1-0",
            GameOutcome::BlackWin => "0-1",
            GameOutcome::Draw => "1/2-1/2",
            GameOutcome::InProgress => "*",
        }
    }

    fn win_for(side: Side) -> Self {
        match side {
            Side::White => GameOutcome::WhiteWin,
            Side::Black => GameOutcome::BlackWin,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::WhiteWin => write!(f, "White wins"),
            GameOutcome::BlackWin => write!(f, "Black wins"),
            GameOutcome::Draw => write!(f, "Draw"),
            GameOutcome::InProgress => write!(f, "In progress"),
        }
    }
}

/// One replayed half-move.
#[derive(Debug, Clone)]
pub struct Ply<P, M> {
    /// Zero-based half-move index.
    pub index: usize,
    /// The side that played `mv`.
    pub side: Side,
    pub before: P,
    pub mv: M,
    pub after: P,
}

impl<P, M> Ply<P, M> {
    /// Full-move number this ply belongs to (1-based).
    pub fn move_number(&self) -> usize {
        self.index / 2 + 1
    }
}

/// Replays a ledger's moves from its initial position.
pub struct Replay<'a, O: PositionOracle> {
    oracle: &'a O,
    position: O::Position,
    moves: std::slice::Iter<'a, O::Move>,
    index: usize,
}

impl<'a, O: PositionOracle> Iterator for Replay<'a, O> {
    type Item = Ply<O::Position, O::Move>;

    fn next(&mut self) -> Option<Self::Item> {
        let mv = self.moves.next()?.clone();
        let before = self.position.clone();
        let after = self.oracle.apply(&before, &mv);
        let side = self.oracle.side_to_move(&before);
        self.position = after.clone();
        let index = self.index;
        self.index += 1;
        Some(Ply {
            index,
            side,
            before,
            mv,
            after,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.moves.size_hint()
    }
}

/// Ordered move history plus the position it leads to.
///
/// The current position is always the initial position with every ledger
/// move applied in order: `positions[0]` is the initial position and
/// `positions[i + 1]` follows `moves[i]`.
pub struct MoveLedger<O: PositionOracle> {
    oracle: O,
    positions: Vec<O::Position>,
    moves: Vec<O::Move>,
    started_at: DateTime<Local>,
}

impl<O: PositionOracle> MoveLedger<O> {
    /// Start an empty ledger at the oracle's initial position.
    pub fn new(oracle: O) -> Self {
        let initial = oracle.initial_position();
        Self {
            oracle,
            positions: vec![initial],
            moves: Vec::new(),
            started_at: Local::now(),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Resolve `text` against the legal moves of the current position and
    /// play it. Returns the move's SAN.
    pub fn apply(&mut self, text: &str) -> Result<String, LedgerError> {
        let mv = self.oracle.parse_move(self.position(), text.trim())?;
        Ok(self.push(mv))
    }

    /// Like [`apply`](Self::apply), for coordinate notation only.
    pub fn apply_uci(&mut self, text: &str) -> Result<String, LedgerError> {
        let mv = self.oracle.parse_uci(self.position(), text.trim())?;
        Ok(self.push(mv))
    }

    /// Play an already-resolved move.
    pub fn apply_move(&mut self, mv: O::Move) -> Result<String, LedgerError> {
        if !self.oracle.is_legal(self.position(), &mv) {
            return Err(LedgerError::IllegalMove(self.oracle.to_uci(&mv)));
        }
        Ok(self.push(mv))
    }

    fn push(&mut self, mv: O::Move) -> String {
        let before = self.position();
        let san = self.oracle.to_san(before, &mv);
        let after = self.oracle.apply(before, &mv);
        self.positions.push(after);
        self.moves.push(mv);
        debug!(san = %san, ply = self.moves.len(), "Move applied");
        san
    }

    /// Take back the last move.
    pub fn undo(&mut self) -> Result<O::Move, LedgerError> {
        let mv = self.moves.pop().ok_or(LedgerError::Empty)?;
        self.positions.pop();
        debug!(ply = self.moves.len(), "Move undone");
        Ok(mv)
    }

    /// Clear all moves and restart the session clock.
    pub fn reset(&mut self) {
        self.positions.truncate(1);
        self.moves.clear();
        self.started_at = Local::now();
        debug!("Ledger reset");
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[O::Move] {
        &self.moves
    }

    pub fn initial_position(&self) -> &O::Position {
        &self.positions[0]
    }

    pub fn position(&self) -> &O::Position {
        // The initial position is never popped.
        &self.positions[self.positions.len() - 1]
    }

    pub fn fen(&self) -> String {
        self.oracle.to_fen(self.position())
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Replay every move from the initial position.
    pub fn replay(&self) -> Replay<'_, O> {
        Replay {
            oracle: &self.oracle,
            position: self.initial_position().clone(),
            moves: self.moves.iter(),
            index: 0,
        }
    }

    /// SAN of every move, recomputed by replay.
    pub fn history_as_text(&self) -> Vec<String> {
        self.replay()
            .map(|ply| self.oracle.to_san(&ply.before, &ply.mv))
            .collect()
    }

    /// History as numbered move pairs: `1. e4 e5 2. Nf3`.
    pub fn numbered_history(&self) -> Vec<String> {
        self.history_as_text()
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect()
    }

    /// Legal moves of the current position in SAN, sorted.
    pub fn legal_moves_text(&self) -> Vec<String> {
        let position = self.position();
        let mut moves: Vec<String> = self
            .oracle
            .legal_moves(position)
            .iter()
            .map(|mv| self.oracle.to_san(position, mv))
            .collect();
        moves.sort();
        moves
    }

    pub fn side_to_move(&self) -> Side {
        self.oracle.side_to_move(self.position())
    }

    /// Full-move number of the next move to be played.
    pub fn move_number(&self) -> usize {
        self.moves.len() / 2 + 1
    }

    pub fn is_check(&self) -> bool {
        self.oracle.is_check(self.position())
    }

    pub fn is_terminal(&self) -> bool {
        self.oracle.is_game_over(self.position())
    }

    /// Outcome of the current position. On checkmate, the side to move is
    /// the side that has been mated.
    pub fn result(&self) -> GameOutcome {
        let position = self.position();
        if self.oracle.is_checkmate(position) {
            GameOutcome::win_for(self.oracle.side_to_move(position).opposite())
        } else if self.oracle.is_stalemate(position)
            || self.oracle.is_insufficient_material(position)
        {
            GameOutcome::Draw
        } else {
            GameOutcome::InProgress
        }
    }
}

impl<O: PositionOracle + Default> Default for MoveLedger<O> {
    fn default() -> Self {
        Self::new(O::default())
    }
}
