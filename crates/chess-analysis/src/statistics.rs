//! Game statistics computed by replaying a ledger.

use chess_ledger::{MoveLedger, PieceKind, PositionOracle, Side};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Material points of a piece kind.
pub fn piece_value(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight | PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 0,
    }
}

/// Material on the board for each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Material {
    pub white: u32,
    pub black: u32,
}

impl Material {
    /// Sum piece values over an inventory.
    pub fn count(pieces: &[(Side, PieceKind)]) -> Self {
        pieces
            .iter()
            .fold(Material::default(), |mut m, &(side, kind)| {
                match side {
                    Side::White => m.white += piece_value(kind),
                    Side::Black => m.black += piece_value(kind),
                }
                m
            })
    }

    /// White minus Black.
    pub fn balance(&self) -> i32 {
        self.white as i32 - self.black as i32
    }
}

/// Counts gathered in one replay pass. Never cached; recompute after any
/// ledger change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStatistics {
    pub total_moves: usize,
    pub captures: usize,
    pub checks: usize,
    pub castles: usize,
    pub promotions: usize,
    pub material: Material,
    pub started_at: DateTime<Local>,
    /// Minutes between session start and the time of computation.
    pub duration_minutes: f64,
}

/// Statistics for the ledger as of now.
pub fn game_statistics<O: PositionOracle>(ledger: &MoveLedger<O>) -> GameStatistics {
    game_statistics_at(ledger, Local::now())
}

/// Statistics for the ledger, with the duration measured up to `now`.
pub fn game_statistics_at<O: PositionOracle>(
    ledger: &MoveLedger<O>,
    now: DateTime<Local>,
) -> GameStatistics {
    let oracle = ledger.oracle();
    let mut stats = GameStatistics {
        total_moves: ledger.len(),
        captures: 0,
        checks: 0,
        castles: 0,
        promotions: 0,
        material: Material::count(&oracle.pieces(ledger.position())),
        started_at: ledger.started_at(),
        duration_minutes: (now - ledger.started_at()).num_milliseconds().max(0) as f64 / 60_000.0,
    };

    for ply in ledger.replay() {
        let traits = oracle.move_traits(&ply.before, &ply.mv);
        stats.captures += usize::from(traits.capture);
        stats.castles += usize::from(traits.castle);
        stats.promotions += usize::from(traits.promotion);
        stats.checks += usize::from(oracle.is_check(&ply.after));
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_ledger::StandardOracle;
    use chrono::Duration;

    fn ledger_with(moves: &[&str]) -> MoveLedger<StandardOracle> {
        let mut ledger = MoveLedger::new(StandardOracle);
        for m in moves {
            ledger.apply(m).unwrap();
        }
        ledger
    }

    #[test]
    fn empty_game_is_all_zero() {
        let ledger = MoveLedger::new(StandardOracle);
        let stats = game_statistics(&ledger);
        assert_eq!(stats.total_moves, 0);
        assert_eq!(stats.captures, 0);
        assert_eq!(stats.checks, 0);
        assert_eq!(stats.castles, 0);
        assert_eq!(stats.promotions, 0);
        assert_eq!(stats.material.balance(), 0);
        assert_eq!(stats.material.white, 39);
    }

    #[test]
    fn counts_captures_checks_and_castles() {
        let ledger = ledger_with(&[
            "e4", "d5", "exd5", "Qxd5", "Nc3", "Qe5+", "Be2", "Nf6", "Nf3", "Qe6", "O-O",
        ]);
        let stats = game_statistics(&ledger);
        assert_eq!(stats.total_moves, 11);
        assert_eq!(stats.captures, 2);
        assert_eq!(stats.checks, 1);
        assert_eq!(stats.castles, 1);
        assert_eq!(stats.promotions, 0);
        assert_eq!(stats.material.balance(), 0);
    }

    #[test]
    fn promotion_and_material() {
        let ledger = ledger_with(&["h4", "g5", "hxg5", "h6", "gxh6", "Nf6", "h7", "Ng8", "hxg8=Q"]);
        let stats = game_statistics(&ledger);
        assert_eq!(stats.promotions, 1);
        assert_eq!(stats.captures, 3);
        // White: 7 pawns + queen promoted on top of the original pieces.
        assert_eq!(stats.material.white, 39 - 1 + 9);
        // Black lost two pawns and a knight.
        assert_eq!(stats.material.black, 39 - 2 - 3);
        assert_eq!(stats.material.balance(), 47 - 34);
    }

    #[test]
    fn duration_in_minutes() {
        let ledger = MoveLedger::new(StandardOracle);
        let later = ledger.started_at() + Duration::seconds(90);
        let stats = game_statistics_at(&ledger, later);
        assert!((stats.duration_minutes - 1.5).abs() < 1e-9);
    }

    #[test]
    fn material_count() {
        let m = Material::count(&[
            (Side::White, PieceKind::Queen),
            (Side::White, PieceKind::King),
            (Side::Black, PieceKind::Rook),
        ]);
        assert_eq!(m, Material { white: 9, black: 5 });
        assert_eq!(m.balance(), 4);
    }
}
