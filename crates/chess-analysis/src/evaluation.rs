//! Chess position evaluation types.

use std::cmp::Ordering;
use std::fmt;

use chess_ledger::Side;
use serde::{Deserialize, Serialize};
use uci::Score;

/// Largest finite evaluation, in pawns. Centipawn scores are clamped to it.
pub const FINITE_LIMIT: f64 = 900.0;

/// Pawn value of a mate delivered on the spot.
pub const MATE_VALUE: f64 = 999.0;

/// Mate distances beyond this are reported as this on the numeric scale,
/// keeping every mate above [`FINITE_LIMIT`].
const MAX_MATE_DISTANCE: u32 = 98;

/// A position evaluation from White's point of view.
///
/// Evaluations are either centipawn scores or forced mates. For numeric
/// consumers, [`to_pawns`](Evaluation::to_pawns) maps both onto one scale
/// where any mate lies beyond [`FINITE_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Evaluation {
    /// Centipawn evaluation (positive = White advantage).
    Centipawns(i32),
    /// Forced mate in `moves` for `winner`. Zero moves means already mated.
    Mate { moves: u32, winner: Side },
}

impl Evaluation {
    /// Convert an engine score, which is relative to the side to move.
    ///
    /// A UCI mate score of zero means the side to move is checkmated.
    pub fn from_uci_score(score: Score, side_to_move: Side) -> Self {
        match score {
            Score::Cp(cp) => match side_to_move {
                Side::White => Evaluation::Centipawns(cp),
                Side::Black => Evaluation::Centipawns(cp.saturating_neg()),
            },
            Score::Mate(n) if n > 0 => Evaluation::Mate {
                moves: n.unsigned_abs(),
                winner: side_to_move,
            },
            Score::Mate(n) => Evaluation::Mate {
                moves: n.unsigned_abs(),
                winner: side_to_move.opposite(),
            },
        }
    }

    /// Evaluation in pawns, White-positive.
    ///
    /// Mate in N for White is `999 - N`, for Black `-(999 - N)`, so fewer
    /// moves to mate is more extreme and a mate outranks any finite score.
    pub fn to_pawns(self) -> f64 {
        match self {
            Evaluation::Centipawns(cp) => {
                (f64::from(cp) / 100.0).clamp(-FINITE_LIMIT, FINITE_LIMIT)
            }
            Evaluation::Mate { moves, winner } => {
                let value = MATE_VALUE - f64::from(moves.min(MAX_MATE_DISTANCE));
                match winner {
                    Side::White => value,
                    Side::Black => -value,
                }
            }
        }
    }

    /// Unclamped sort key: band (Black mates, scores, White mates), then
    /// the value within the band. Distinct evaluations get distinct keys.
    fn rank(self) -> (i8, i64) {
        match self {
            Evaluation::Mate {
                moves,
                winner: Side::Black,
            } => (-1, i64::from(moves)),
            Evaluation::Centipawns(cp) => (0, i64::from(cp)),
            Evaluation::Mate {
                moves,
                winner: Side::White,
            } => (1, -i64::from(moves)),
        }
    }
}

impl Ord for Evaluation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Evaluation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(_) => write!(f, "{:+.2}", self.to_pawns()),
            Evaluation::Mate { moves: 0, winner } => write!(f, "Checkmate, {} wins", winner),
            Evaluation::Mate { moves, winner } => write!(f, "{} mates in {}", winner, moves),
        }
    }
}
