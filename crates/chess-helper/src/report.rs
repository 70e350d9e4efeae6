//! Plain-text game analysis report.

use std::path::{Path, PathBuf};

use chess_analysis::{GameStatistics, MoveAssessment, MoveQuality, QualityReport, TierCounts};
use chess_ledger::{MoveLedger, PositionOracle, Side};
use chrono::{DateTime, Local};

use crate::pgn::{write_export, ExportError};

const RULE_WIDTH: usize = 50;

/// Default report file name for a report written at `now`.
pub fn report_filename(now: DateTime<Local>) -> String {
    format!("game_analysis_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Render the report. Sections always come in the same order: header,
/// game statistics, move quality, move history.
///
/// `quality` is `None` when the engine could not analyze the game.
pub fn to_report<O: PositionOracle>(
    ledger: &MoveLedger<O>,
    stats: &GameStatistics,
    quality: Option<&QualityReport>,
) -> String {
    let result = ledger.result();
    let mut lines = vec![
        "CHESS GAME ANALYSIS REPORT".to_string(),
        "=".repeat(RULE_WIDTH),
        format!("Date: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Duration: {:.1} minutes", stats.duration_minutes),
        format!("Total Moves: {}", stats.total_moves),
        format!("Result: {} ({})", result.pgn_token(), result),
        String::new(),
        "GAME STATISTICS:".to_string(),
        format!("  Captures: {}", stats.captures),
        format!("  Checks: {}", stats.checks),
        format!("  Castles: {}", stats.castles),
        format!("  Promotions: {}", stats.promotions),
        format!(
            "  Material: White {}, Black {}",
            stats.material.white, stats.material.black
        ),
        format!("  Material Balance: {:+}", stats.material.balance()),
        String::new(),
        "MOVE QUALITY ANALYSIS:".to_string(),
    ];

    match quality {
        Some(report) => lines.extend(quality_section(report)),
        None => lines.push("  Engine analysis unavailable".to_string()),
    }

    lines.push(String::new());
    lines.push("MOVE HISTORY:".to_string());
    lines.extend(move_history(&ledger.history_as_text()));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Write a rendered report to `path`.
pub fn write_report(path: &Path, report: &str) -> Result<(), ExportError> {
    write_export(path, report)
}

/// Write a rendered report into `dir` under the default file name.
pub fn write_report_in(dir: &Path, report: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(report_filename(Local::now()));
    write_report(&path, report)?;
    Ok(path)
}

fn quality_section(report: &QualityReport) -> Vec<String> {
    let overall = &report.overall;
    let mut lines = vec![
        format!("  Excellent moves: {}", overall.excellent),
        format!("  Inaccuracies: {}", overall.inaccuracies),
        format!("  Mistakes: {}", overall.mistakes),
        format!("  Blunders: {}", overall.blunders),
        format!("  Average loss: {:.2} pawns", overall.average_loss()),
    ];
    if report.skipped.is_empty() {
        lines.push(format!("  Moves evaluated: {}", overall.evaluated));
    } else {
        lines.push(format!(
            "  Moves evaluated: {} ({} skipped)",
            overall.evaluated,
            report.skipped.len()
        ));
    }

    lines.push(String::new());
    lines.push(side_summary("White", &report.white));
    lines.push(side_summary("Black", &report.black));

    let notable: Vec<&MoveAssessment> = report
        .moves
        .iter()
        .filter(|m| {
            matches!(
                m.quality,
                MoveQuality::Inaccuracy | MoveQuality::Mistake | MoveQuality::Blunder
            )
        })
        .collect();
    if !notable.is_empty() {
        lines.push(String::new());
        lines.push("  Notable moves:".to_string());
        for m in notable {
            lines.push(format!(
                "    {} {}: {} (loss {:.2})",
                move_label(m.ply, m.side),
                m.san,
                m.quality,
                m.loss
            ));
        }
    }
    lines
}

fn side_summary(side: &str, counts: &TierCounts) -> String {
    format!(
        "  {}: {} excellent, {} inaccuracies, {} mistakes, {} blunders, average loss {:.2}",
        side,
        counts.excellent,
        counts.inaccuracies,
        counts.mistakes,
        counts.blunders,
        counts.average_loss()
    )
}

/// `3.` for White's third move, `3...` for Black's.
fn move_label(ply: usize, side: Side) -> String {
    match side {
        Side::White => format!("{}.", ply / 2 + 1),
        Side::Black => format!("{}...", ply / 2 + 1),
    }
}

fn move_history(history: &[String]) -> Vec<String> {
    history
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| match pair {
            [white, black] => format!("{:2}. {:<10} {}", i + 1, white, black),
            [white] => format!("{:2}. {}", i + 1, white),
            _ => String::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_analysis::{game_statistics_at, Evaluation};
    use chess_ledger::StandardOracle;
    use chrono::{Duration, TimeZone};

    fn ledger_with(moves: &[&str]) -> MoveLedger<StandardOracle> {
        let mut ledger = MoveLedger::new(StandardOracle);
        for m in moves {
            ledger.apply(m).unwrap();
        }
        ledger
    }

    fn cp(centipawns: i32) -> Evaluation {
        Evaluation::Centipawns(centipawns)
    }

    #[test]
    fn test_sections_in_order() {
        let ledger = ledger_with(&["e4", "e5", "Qh5"]);
        let stats = game_statistics_at(&ledger, ledger.started_at() + Duration::seconds(150));
        let mut quality = QualityReport::default();
        quality.record(MoveAssessment::new(0, Side::White, "e4".into(), cp(20), cp(30)));
        quality.record(MoveAssessment::new(1, Side::Black, "e5".into(), cp(30), cp(30)));
        quality.record(MoveAssessment::new(2, Side::White, "Qh5".into(), cp(30), cp(-210)));

        let report = to_report(&ledger, &stats, Some(&quality));

        let order = [
            "CHESS GAME ANALYSIS REPORT",
            "GAME STATISTICS:",
            "MOVE QUALITY ANALYSIS:",
            "MOVE HISTORY:",
        ];
        let positions: Vec<usize> = order.iter().map(|s| report.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(report.contains(&"=".repeat(50)));
        assert!(report.contains("Duration: 2.5 minutes"));
        assert!(report.contains("Total Moves: 3"));
        assert!(report.contains("Result: * (In progress)"));
        assert!(report.contains("  Material Balance: +0"));
        assert!(report.contains("  Blunders: 1"));
        assert!(report.contains("  Moves evaluated: 3"));
        assert!(report.contains("    2. Qh5: Blunder (loss 2.40)"));
        assert!(report.contains("  White: 0 excellent, 0 inaccuracies, 0 mistakes, 1 blunders"));
        assert!(report.contains(" 1. e4         e5\n 2. Qh5\n"));
    }

    #[test]
    fn test_report_without_engine() {
        let ledger = ledger_with(&["d4", "d5", "c4", "dxc4"]);
        let stats = game_statistics_at(&ledger, ledger.started_at());
        let report = to_report(&ledger, &stats, None);

        assert!(report.contains("MOVE QUALITY ANALYSIS:\n  Engine analysis unavailable\n"));
        assert!(report.contains("  Captures: 1"));
        assert!(report.contains("  Material Balance: -1"));
        assert!(report.ends_with(" 1. d4         d5\n 2. c4         dxc4\n"));
    }

    #[test]
    fn test_skipped_moves_are_reported() {
        let ledger = ledger_with(&["e4", "e5"]);
        let stats = game_statistics_at(&ledger, ledger.started_at());
        let mut quality = QualityReport::default();
        quality.record(MoveAssessment::new(0, Side::White, "e4".into(), cp(20), cp(30)));
        quality.skip(1);

        let report = to_report(&ledger, &stats, Some(&quality));
        assert!(report.contains("  Moves evaluated: 1 (1 skipped)"));
        assert!(!report.contains("Notable moves"));
    }

    #[test]
    fn test_black_moves_are_labelled() {
        assert_eq!(move_label(5, Side::Black), "3...");
        assert_eq!(move_label(4, Side::White), "3.");
    }

    #[test]
    fn test_checkmate_result_line() {
        let ledger = ledger_with(&["f3", "e5", "g4", "Qh4#"]);
        let stats = game_statistics_at(&ledger, ledger.started_at());
        let report = to_report(&ledger, &stats, None);
        assert!(report.contains("Result: 0-1 (Black wins)"));
        assert!(report.contains("  Checks: 1"));
    }

    #[test]
    fn test_report_filename() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(report_filename(now), "game_analysis_20240309_140507.txt");
    }

    #[test]
    fn test_write_report_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report_in(dir.path(), "report body\n").unwrap();

        assert!(path.starts_with(dir.path()));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("game_analysis_") && name.ends_with(".txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "report body\n");
    }

    #[test]
    fn test_write_report_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("report.txt");
        let err = write_report(&path, "x").unwrap_err();
        assert_eq!(err.destination, path);
    }
}
