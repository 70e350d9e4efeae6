//! The position oracle contract.
//!
//! The ledger never decides legality itself. Everything it knows about the
//! rules of chess comes through [`PositionOracle`], which keeps the ledger
//! testable against a scripted oracle and lets the real rules live in an
//! external crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Returns the opposite side.
    pub const fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

/// Piece kinds, as reported in a position's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// What kind of move a move is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveTraits {
    pub capture: bool,
    pub castle: bool,
    pub promotion: bool,
}

/// Why move text could not be resolved to a legal move.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("cannot parse move: {0}")]
    Malformed(String),
    #[error("illegal move: {0}")]
    Illegal(String),
    #[error("ambiguous move: {0}")]
    Ambiguous(String),
}

/// Rules of the game, consumed as an opaque and correct capability.
///
/// Positions are immutable values: [`apply`](PositionOracle::apply) returns
/// a new position and leaves its input untouched.
pub trait PositionOracle {
    type Position: Clone + fmt::Debug;
    type Move: Clone + PartialEq + fmt::Debug;

    /// The position every game starts from.
    fn initial_position(&self) -> Self::Position;

    /// All legal moves in `position`.
    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;

    /// Resolve move text (SAN, or whatever the oracle also accepts) against
    /// the legal moves of `position`.
    fn parse_move(&self, position: &Self::Position, text: &str)
        -> Result<Self::Move, MoveParseError>;

    /// Resolve coordinate notation (`e2e4`, `e7e8q`).
    fn parse_uci(&self, position: &Self::Position, text: &str)
        -> Result<Self::Move, MoveParseError>;

    /// Play a legal move.
    fn apply(&self, position: &Self::Position, mv: &Self::Move) -> Self::Position;

    fn to_fen(&self, position: &Self::Position) -> String;

    /// SAN for `mv` played from `position`, with check or mate suffix.
    fn to_san(&self, position: &Self::Position, mv: &Self::Move) -> String;

    fn to_uci(&self, mv: &Self::Move) -> String;

    fn side_to_move(&self, position: &Self::Position) -> Side;

    fn is_check(&self, position: &Self::Position) -> bool;

    fn is_checkmate(&self, position: &Self::Position) -> bool;

    fn is_stalemate(&self, position: &Self::Position) -> bool;

    fn is_insufficient_material(&self, position: &Self::Position) -> bool;

    fn move_traits(&self, position: &Self::Position, mv: &Self::Move) -> MoveTraits;

    /// Every piece on the board, one entry per piece.
    fn pieces(&self, position: &Self::Position) -> Vec<(Side, PieceKind)>;

    /// Returns true if `mv` is legal in `position`.
    fn is_legal(&self, position: &Self::Position, mv: &Self::Move) -> bool {
        self.legal_moves(position).contains(mv)
    }

    /// Returns true if the game cannot continue from `position`.
    fn is_game_over(&self, position: &Self::Position) -> bool {
        self.is_checkmate(position)
            || self.is_stalemate(position)
            || self.is_insufficient_material(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_opposite() {
        assert_eq!(Side::White.opposite(), Side::Black);
        assert_eq!(Side::Black.opposite(), Side::White);
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::White.to_string(), "White");
        assert_eq!(Side::Black.to_string(), "Black");
    }

    #[test]
    fn parse_error_display() {
        assert_eq!(
            MoveParseError::Ambiguous("Nd2".to_string()).to_string(),
            "ambiguous move: Nd2"
        );
    }
}
