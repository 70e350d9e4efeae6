//! Whole-game move quality classification.
//!
//! [`classify_game`] replays a ledger and asks the engine for the evaluation
//! before and after every move. Moves whose evaluations fail are skipped;
//! whatever was computed before the failure is kept.

use chess_ledger::{MoveLedger, PositionOracle};
use thiserror::Error;
use tracing::{debug, info};

use crate::adapter::{EngineAdapter, EngineLauncher};
use crate::quality::{MoveAssessment, QualityReport};

/// Errors that can occur during game analysis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("Analysis engine is not available")]
    EngineUnavailable,
}

/// Classify every move of the game.
///
/// # Errors
///
/// `AnalyzerError::EngineUnavailable` if the engine cannot be reached when
/// the analysis starts.
pub fn classify_game<O, L>(
    ledger: &MoveLedger<O>,
    adapter: &mut EngineAdapter<O, L>,
) -> Result<QualityReport, AnalyzerError>
where
    O: PositionOracle,
    L: EngineLauncher,
{
    if !adapter.is_available() {
        return Err(AnalyzerError::EngineUnavailable);
    }

    let oracle = ledger.oracle();
    let mut report = QualityReport::default();

    for ply in ledger.replay() {
        let before = adapter.evaluate(&ply.before);
        let after = adapter.evaluate(&ply.after);
        match (before, after) {
            (Some(before), Some(after)) => {
                let san = oracle.to_san(&ply.before, &ply.mv);
                report.record(MoveAssessment::new(ply.index, ply.side, san, before, after));
            }
            _ => {
                debug!(ply = ply.index, "Evaluation failed, move skipped");
                report.skip(ply.index);
            }
        }
    }

    info!(
        evaluated = report.overall.evaluated,
        skipped = report.skipped.len(),
        "Game classified"
    );
    Ok(report)
}
