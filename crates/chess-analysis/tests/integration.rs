//! Integration tests for chess-analysis crate.
//!
//! Tests marked `#[ignore]` require Stockfish to be installed and available
//! in PATH. Run with: `cargo test -p chess-analysis --test integration -- --ignored`

use chess_analysis::testing::ScriptedLauncher;
use chess_analysis::{
    classify_game, game_statistics, EngineAdapter, EngineLocator, EnginePreset, EngineSettings,
    Evaluation, MoveQuality, SessionState,
};
use chess_ledger::{MoveLedger, PositionOracle, Side, StandardOracle};
use uci::Score;

/// Check if Stockfish is available in PATH.
fn stockfish_available() -> bool {
    std::process::Command::new("stockfish")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

fn scholars_mate() -> MoveLedger<StandardOracle> {
    let mut ledger = MoveLedger::new(StandardOracle);
    for m in ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7#"] {
        ledger.apply(m).unwrap();
    }
    ledger
}

#[test]
fn scripted_scholars_mate_analysis() {
    let launcher = ScriptedLauncher::new();
    let ledger = scholars_mate();

    // White-relative scores for each position, the final one mated.
    let scores = [
        Score::Cp(20),
        Score::Cp(30),
        Score::Cp(30),
        Score::Cp(0),
        Score::Cp(0),
        Score::Cp(10),
        Score::Mate(1),
        Score::Mate(0),
    ];
    launcher.score(&StandardOracle.to_fen(ledger.initial_position()), scores[0]);
    for (ply, score) in ledger.replay().zip(&scores[1..]) {
        launcher.score(&StandardOracle.to_fen(&ply.after), *score);
    }

    let mut adapter = EngineAdapter::with_launcher(
        StandardOracle,
        launcher.clone(),
        EngineLocator::default(),
        EngineSettings::default().with_preset(EnginePreset::Deep),
    );

    let report = classify_game(&ledger, &mut adapter).unwrap();
    assert_eq!(report.moves.len(), 7);
    assert!(report.skipped.is_empty());

    // 5...Nf6 allows mate in one.
    let nf6 = &report.moves[5];
    assert_eq!(nf6.san, "Nf6");
    assert_eq!(nf6.side, Side::Black);
    assert_eq!(nf6.quality, MoveQuality::Blunder);
    assert_eq!(report.black.blunders, 1);

    // Delivering mate keeps the sentinel band ordering.
    let mate = &report.moves[6];
    assert_eq!(
        mate.after,
        Evaluation::Mate {
            moves: 0,
            winner: Side::White
        }
    );
    assert_eq!(mate.quality, MoveQuality::Good);
    assert_eq!(launcher.configured()[0].depth, 20);

    let stats = game_statistics(&ledger);
    assert_eq!(stats.captures, 1);
    assert_eq!(stats.checks, 1);
}

#[test]
fn scripted_recovery_cycle() {
    let launcher = ScriptedLauncher::new();
    let ledger = scholars_mate();
    let mut adapter = EngineAdapter::with_launcher(
        StandardOracle,
        launcher.clone(),
        EngineLocator::default(),
        EngineSettings::default(),
    );

    launcher.kill();
    assert!(adapter.is_available());

    launcher.kill();
    assert!(adapter.top_moves(ledger.position(), 3).is_empty());
    assert_eq!(adapter.state(), SessionState::Crashed);
    assert!(classify_game(&ledger, &mut adapter).is_err());

    assert!(adapter.recover());
    assert!(adapter.is_available());
}

#[test]
#[ignore = "requires Stockfish"]
fn stockfish_evaluates_start_position() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let mut adapter = EngineAdapter::new(
        StandardOracle,
        EngineLocator::new(None),
        EngineSettings::default().with_preset(EnginePreset::Live),
    );
    let start = StandardOracle.initial_position();

    assert!(adapter.is_available());
    let eval = adapter.evaluate(&start).expect("evaluation");
    assert!(eval.to_pawns().abs() < 1.5, "start position should be balanced, got {}", eval);

    let best = adapter.best_move(&start).expect("best move");
    assert!(StandardOracle.is_legal(&start, &best));

    let top = adapter.top_moves(&start, 3);
    assert_eq!(top.len(), 3);
    assert!(adapter.status().name.unwrap().to_lowercase().contains("stockfish"));
}

#[test]
#[ignore = "requires Stockfish"]
fn stockfish_classifies_scholars_mate() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let ledger = scholars_mate();
    let mut adapter = EngineAdapter::new(
        StandardOracle,
        EngineLocator::new(None),
        EngineSettings::default().with_preset(EnginePreset::Live),
    );

    let report = classify_game(&ledger, &mut adapter).expect("engine available");
    assert_eq!(report.moves.len(), 7);
    assert_eq!(report.moves[5].quality, MoveQuality::Blunder);
    assert!(adapter.best_move(ledger.position()).is_none());
    assert_eq!(adapter.state(), SessionState::Ready);
}
