//! Move quality classification.

use std::fmt;

use chess_ledger::Side;
use serde::Serialize;

use crate::Evaluation;

/// Classification of move quality based on evaluation loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    /// The move gained two pawns or more on the engine's expectation.
    Excellent,
    /// Within half a pawn of the best play, or better.
    Good,
    /// Lost more than half a pawn.
    Inaccuracy,
    /// Lost more than a pawn.
    Mistake,
    /// Lost more than two pawns.
    Blunder,
}

impl MoveQuality {
    /// Tier for a loss in pawns. Each upper bound is inclusive.
    pub fn from_loss(loss: f64) -> Self {
        if loss <= -2.0 {
            MoveQuality::Excellent
        } else if loss <= 0.5 {
            MoveQuality::Good
        } else if loss <= 1.0 {
            MoveQuality::Inaccuracy
        } else if loss <= 2.0 {
            MoveQuality::Mistake
        } else {
            MoveQuality::Blunder
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoveQuality::Excellent => "Excellent",
            MoveQuality::Good => "Good",
            MoveQuality::Inaccuracy => "Inaccuracy",
            MoveQuality::Mistake => "Mistake",
            MoveQuality::Blunder => "Blunder",
        }
    }
}

impl fmt::Display for MoveQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evaluation loss for the side that moved, in pawns. Positive is bad for
/// the mover.
pub fn evaluation_loss(mover: Side, before: Evaluation, after: Evaluation) -> f64 {
    // Work in whole hundredths so tier boundaries compare exactly.
    let hundredths = |e: Evaluation| (e.to_pawns() * 100.0).round() as i64;
    let (before, after) = (hundredths(before), hundredths(after));
    let loss = match mover {
        Side::White => before - after,
        Side::Black => after - before,
    };
    loss as f64 / 100.0
}

/// Quality record for one applied move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveAssessment {
    /// Zero-based half-move index.
    pub ply: usize,
    pub side: Side,
    pub san: String,
    pub before: Evaluation,
    pub after: Evaluation,
    pub loss: f64,
    pub quality: MoveQuality,
}

impl MoveAssessment {
    pub fn new(ply: usize, side: Side, san: String, before: Evaluation, after: Evaluation) -> Self {
        let loss = evaluation_loss(side, before, after);
        Self {
            ply,
            side,
            san,
            before,
            after,
            loss,
            quality: MoveQuality::from_loss(loss),
        }
    }
}

/// Tier tallies and mean absolute loss over evaluated moves.
///
/// `Good` moves count toward `evaluated` and the mean, but have no tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierCounts {
    pub excellent: u32,
    pub inaccuracies: u32,
    pub mistakes: u32,
    pub blunders: u32,
    pub evaluated: u32,
    total_loss: f64,
}

impl TierCounts {
    pub fn record(&mut self, assessment: &MoveAssessment) {
        match assessment.quality {
            MoveQuality::Excellent => self.excellent += 1,
            MoveQuality::Good => {}
            MoveQuality::Inaccuracy => self.inaccuracies += 1,
            MoveQuality::Mistake => self.mistakes += 1,
            MoveQuality::Blunder => self.blunders += 1,
        }
        self.evaluated += 1;
        self.total_loss += assessment.loss.abs();
    }

    /// Mean of `|loss|`, zero when nothing was evaluated.
    pub fn average_loss(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.total_loss / f64::from(self.evaluated)
        }
    }
}

/// Per-move assessments plus overall and per-side tallies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub moves: Vec<MoveAssessment>,
    pub overall: TierCounts,
    pub white: TierCounts,
    pub black: TierCounts,
    /// Plies skipped because an evaluation failed.
    pub skipped: Vec<usize>,
}

impl QualityReport {
    pub fn record(&mut self, assessment: MoveAssessment) {
        self.overall.record(&assessment);
        match assessment.side {
            Side::White => self.white.record(&assessment),
            Side::Black => self.black.record(&assessment),
        }
        self.moves.push(assessment);
    }

    pub fn skip(&mut self, ply: usize) {
        self.skipped.push(ply);
    }

    pub fn for_side(&self, side: Side) -> &TierCounts {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    /// Assessments in a given tier.
    pub fn with_quality(&self, quality: MoveQuality) -> impl Iterator<Item = &MoveAssessment> {
        self.moves.iter().filter(move |m| m.quality == quality)
    }
}
