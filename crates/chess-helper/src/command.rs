//! Interactive commands.
//!
//! [`Command::parse`] turns one input line into a command; anything that is
//! not a known command word is treated as a move. [`execute`] runs a
//! command against a session and writes the response.

use std::io::{self, Write};
use std::path::PathBuf;

use chess_analysis::{EngineLauncher, EnginePreset};
use thiserror::Error;

use crate::pgn::ExportError;
use crate::session::HelperSession;

pub const HELP: &str = "\
Available commands:
  [move]            Make a move (e.g. e4, Nf3, O-O, Qxe7+, or e2e4)
  help              Show this help message
  board             Show the current position
  moves             Show legal moves
  history           Show move history
  undo              Undo last move
  reset             Start a new game
  hint              Show the engine's best move
  analyze           Show best move, evaluation and alternatives
  analysis          Toggle analysis after each move
  quality           Classify every move played so far
  stats             Show game statistics
  pgn               Print the game as PGN
  save [file]       Save game as PGN
  report [file]     Save the analysis report
  engine [preset]   Show engine status, or switch to the live/deep preset
  recover           Restart a crashed engine
  config            Show current settings
  set <key> <val>   Change a setting (e.g. set engine.depth 20)
  quit              Exit";

/// Errors for command lines that name a command but misuse it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown engine preset '{0}', expected live or deep")]
    UnknownPreset(String),
}

/// One interactive command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(String),
    Help,
    Board,
    Moves,
    History,
    Undo,
    Reset,
    Hint,
    Analyze,
    ToggleAnalysis,
    Quality,
    Stats,
    Pgn,
    Save(Option<PathBuf>),
    Report(Option<PathBuf>),
    Engine(Option<EnginePreset>),
    Recover,
    Config,
    Set { key: String, value: String },
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();
        let path_arg = || args.first().map(|p| PathBuf::from(*p));

        let command = match first.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "board" | "status" => Command::Board,
            "moves" => Command::Moves,
            "history" => Command::History,
            "undo" => Command::Undo,
            "reset" | "new" => Command::Reset,
            "hint" => Command::Hint,
            "analyze" | "eval" => Command::Analyze,
            "analysis" => Command::ToggleAnalysis,
            "quality" => Command::Quality,
            "stats" => Command::Stats,
            "pgn" => Command::Pgn,
            "save" => Command::Save(path_arg()),
            "report" => Command::Report(path_arg()),
            "engine" => match args.first() {
                None => Command::Engine(None),
                Some(preset) => Command::Engine(Some(parse_preset(preset)?)),
            },
            "recover" => Command::Recover,
            "config" => Command::Config,
            "set" => match args.as_slice() {
                [key, value @ ..] if !value.is_empty() => Command::Set {
                    key: key.to_string(),
                    value: value.join(" "),
                },
                _ => return Err(CommandError::Usage("set <key> <value>")),
            },
            _ => Command::Move(line.to_string()),
        };
        Ok(Some(command))
    }
}

fn parse_preset(name: &str) -> Result<EnginePreset, CommandError> {
    match name.to_ascii_lowercase().as_str() {
        "live" => Ok(EnginePreset::Live),
        "deep" => Ok(EnginePreset::Deep),
        _ => Err(CommandError::UnknownPreset(name.to_string())),
    }
}

/// Move tokens from a move list, dropping move numbers and result tokens:
/// `["1.", "e4", "e5", "2.", "Nf3", "*"]` gives `["e4", "e5", "Nf3"]`.
pub fn move_tokens<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.as_ref().split_whitespace())
        .map(|token| {
            // "1.e4" and "1...e5" carry the move after the number.
            match token.rfind('.') {
                Some(dot) if token[..dot].chars().all(|c| c.is_ascii_digit() || c == '.') => {
                    &token[dot + 1..]
                }
                _ => token,
            }
        })
        .filter(|token| !token.is_empty())
        .filter(|token| !matches!(*token, "1-0" | "0-1" | "1/2-1/2" | "*"))
        .map(str::to_string)
        .collect()
}

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A setting changed and should be persisted.
    ConfigChanged,
    Quit,
}

/// Run `command` against `session`, writing the response to `out`.
pub fn execute<L: EngineLauncher, W: Write>(
    session: &mut HelperSession<L>,
    command: Command,
    out: &mut W,
) -> io::Result<Flow> {
    match command {
        Command::Move(text) => match session.play(&text) {
            Ok(played) => {
                writeln!(out, "Move played: {}", played.san)?;
                writeln!(out, "{}", session.position_info())?;
                report_autosave(out, played.autosave)?;
                if let Some(analysis) = played.analysis {
                    writeln!(out, "\nEngine analysis:\n{}", analysis)?;
                }
                if session.ledger().is_terminal() {
                    writeln!(out, "\nGame over! Result: {}", played.outcome.pgn_token())?;
                }
            }
            Err(e) => writeln!(out, "Invalid or illegal move: {}", e)?,
        },
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Board => writeln!(out, "{}", session.position_info())?,
        Command::Moves => {
            let moves = session.ledger().legal_moves_text();
            if moves.is_empty() {
                writeln!(out, "No legal moves available.")?;
            } else {
                writeln!(out, "Legal moves ({}):", moves.len())?;
                for row in moves.chunks(8) {
                    writeln!(out, "  {}", row.join("  "))?;
                }
            }
        }
        Command::History => {
            let history = session.ledger().numbered_history();
            if history.is_empty() {
                writeln!(out, "No moves played yet.")?;
            } else {
                writeln!(out, "Move history ({} moves):", session.ledger().len())?;
                for pair in history {
                    writeln!(out, "  {}", pair)?;
                }
            }
        }
        Command::Undo => match session.undo() {
            Ok((san, autosave)) => {
                writeln!(out, "Undid {}", san)?;
                report_autosave(out, autosave)?;
                writeln!(out, "{}", session.position_info())?;
            }
            Err(e) => writeln!(out, "Cannot undo: {}", e)?,
        },
        Command::Reset => {
            session.reset();
            writeln!(out, "New game started!")?;
            writeln!(out, "{}", session.position_info())?;
        }
        Command::Hint => match session.hint() {
            Some(san) => writeln!(out, "Hint: {}", san)?,
            None => writeln!(out, "No hint available.")?,
        },
        Command::Analyze => match session.analysis() {
            Some(analysis) => {
                writeln!(out, "FEN: {}", session.ledger().fen())?;
                writeln!(out, "{}", analysis)?;
            }
            None if session.ledger().is_terminal() => writeln!(out, "The game is over.")?,
            None => writeln!(out, "Engine analysis not available.")?,
        },
        Command::ToggleAnalysis => {
            let enabled = session.toggle_analysis();
            let state = if enabled { "enabled" } else { "disabled" };
            writeln!(out, "Engine analysis {}.", state)?;
        }
        Command::Quality => match session.quality() {
            Ok(report) => {
                let counts = &report.overall;
                writeln!(out, "Moves evaluated: {}", counts.evaluated)?;
                writeln!(out, "Excellent moves: {}", counts.excellent)?;
                writeln!(out, "Inaccuracies: {}", counts.inaccuracies)?;
                writeln!(out, "Mistakes: {}", counts.mistakes)?;
                writeln!(out, "Blunders: {}", counts.blunders)?;
                writeln!(out, "Average loss: {:.2} pawns", counts.average_loss())?;
                for m in report.moves.iter().filter(|m| m.loss > 0.5) {
                    writeln!(out, "  {} by {}: {} ({:.2})", m.san, m.side, m.quality, m.loss)?;
                }
            }
            Err(e) => writeln!(out, "{}", e)?,
        },
        Command::Stats => {
            let stats = session.statistics();
            writeln!(out, "Total moves: {}", stats.total_moves)?;
            writeln!(out, "Captures: {}", stats.captures)?;
            writeln!(out, "Checks: {}", stats.checks)?;
            writeln!(out, "Castles: {}", stats.castles)?;
            writeln!(out, "Promotions: {}", stats.promotions)?;
            writeln!(out, "Material balance: {:+}", stats.material.balance())?;
            writeln!(out, "Duration: {:.1} minutes", stats.duration_minutes)?;
        }
        Command::Pgn => write!(out, "{}", session.pgn())?,
        Command::Save(path) => match session.save_pgn(path.as_deref()) {
            Ok(path) => writeln!(out, "Game saved to {}", path.display())?,
            Err(e) => writeln!(out, "Save failed: {}", e)?,
        },
        Command::Report(path) => match session.save_report(path.as_deref()) {
            Ok(path) => writeln!(out, "Report saved to {}", path.display())?,
            Err(e) => writeln!(out, "Report failed: {}", e)?,
        },
        Command::Engine(None) => {
            session.engine_available();
            writeln!(out, "{}", session.engine_status())?;
        }
        Command::Engine(Some(preset)) => {
            session.apply_preset(preset);
            writeln!(out, "{}", session.engine_status())?;
            return Ok(Flow::ConfigChanged);
        }
        Command::Recover => {
            if session.recover_engine() {
                writeln!(out, "Engine ready.")?;
            } else {
                writeln!(out, "Engine could not be started.")?;
            }
        }
        Command::Config => writeln!(out, "{}", session.config())?,
        Command::Set { key, value } => match session.set(&key, &value) {
            Ok(()) => {
                writeln!(out, "Set {} = {}", key, value)?;
                return Ok(Flow::ConfigChanged);
            }
            Err(e) => writeln!(out, "{}", e)?,
        },
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn report_autosave<W: Write>(
    out: &mut W,
    autosave: Result<Option<PathBuf>, ExportError>,
) -> io::Result<()> {
    match autosave {
        Ok(Some(path)) => writeln!(out, "Auto-saved game to {}", path.display()),
        Ok(None) => Ok(()),
        Err(e) => writeln!(out, "Auto-save failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HelperConfig;
    use chess_analysis::testing::ScriptedLauncher;
    use uci::Score;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    fn session(
        dir: &std::path::Path,
        launcher: &ScriptedLauncher,
    ) -> HelperSession<ScriptedLauncher> {
        let mut config = HelperConfig::default();
        config.game.export_dir = dir.join("saved");
        config.game.auto_analysis = false;
        HelperSession::with_launcher(config, launcher.clone())
    }

    fn run(session: &mut HelperSession<ScriptedLauncher>, line: &str) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = execute(session, parse(line), &mut out).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_command_words() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(parse("help"), Command::Help);
        assert_eq!(parse("QUIT"), Command::Quit);
        assert_eq!(parse("exit"), Command::Quit);
        assert_eq!(parse("undo"), Command::Undo);
        assert_eq!(parse("eval"), Command::Analyze);
        assert_eq!(parse("analysis"), Command::ToggleAnalysis);
        assert_eq!(parse("save"), Command::Save(None));
        assert_eq!(
            parse("save games/mine.pgn"),
            Command::Save(Some(PathBuf::from("games/mine.pgn")))
        );
        assert_eq!(parse("engine"), Command::Engine(None));
        assert_eq!(parse("engine deep"), Command::Engine(Some(EnginePreset::Deep)));
        assert_eq!(
            parse("set game.white Magnus Carlsen"),
            Command::Set {
                key: "game.white".to_string(),
                value: "Magnus Carlsen".to_string()
            }
        );
    }

    #[test]
    fn anything_else_is_a_move() {
        assert_eq!(parse("Nf3"), Command::Move("Nf3".to_string()));
        assert_eq!(parse(" e2e4 "), Command::Move("e2e4".to_string()));
        assert_eq!(parse("O-O"), Command::Move("O-O".to_string()));
    }

    #[test]
    fn usage_errors() {
        assert_eq!(
            Command::parse("set engine.depth"),
            Err(CommandError::Usage("set <key> <value>"))
        );
        assert_eq!(
            Command::parse("engine turbo"),
            Err(CommandError::UnknownPreset("turbo".to_string()))
        );
    }

    #[test]
    fn move_tokens_strip_numbers_and_results() {
        assert_eq!(
            move_tokens(&["1.", "e4", "e5", "2.", "Nf3", "*"]),
            vec!["e4", "e5", "Nf3"]
        );
        assert_eq!(
            move_tokens(&["1.e4 e5 2.Nf3 Nc6 3.Bb5 1-0"]),
            vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]
        );
        assert_eq!(move_tokens(&["12...Qxf7#"]), vec!["Qxf7#"]);
        assert_eq!(move_tokens(&["e2e4", "e7e5"]), vec!["e2e4", "e7e5"]);
        assert!(move_tokens::<&str>(&[]).is_empty());
    }

    #[test]
    fn board_shows_diagram_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());
        run(&mut session, "d4");

        let (flow, out) = run(&mut session, "board");
        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with("  a b c d e f g h\n8 r n b q k b n r 8"));
        assert!(out.contains("4 . . . P . . . . 4"));
        assert!(out.contains("To move: Black"));
        assert!(out.contains("FEN: "));
    }

    #[test]
    fn move_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());

        let (flow, out) = run(&mut session, "e4");
        assert_eq!(flow, Flow::Continue);
        assert!(out.contains("Move played: e4"));
        assert!(out.contains("To move: Black"));

        let (_, out) = run(&mut session, "e4");
        assert!(out.starts_with("Invalid or illegal move"));

        run(&mut session, "e5");
        run(&mut session, "Nf3");
        let (_, out) = run(&mut session, "history");
        assert!(out.contains("Move history (3 moves):"));
        assert!(out.contains("  1. e4 e5\n  2. Nf3\n"));
    }

    #[test]
    fn undo_on_empty_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());
        let (_, out) = run(&mut session, "undo");
        assert_eq!(out, "Cannot undo: no moves to undo\n");
    }

    #[test]
    fn legal_moves_listing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());
        let (_, out) = run(&mut session, "moves");
        assert!(out.starts_with("Legal moves (20):"));
        assert_eq!(out.lines().count(), 1 + 3);
    }

    #[test]
    fn checkmate_ends_the_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());
        for m in ["f3", "e5", "g4"] {
            run(&mut session, m);
        }
        let (_, out) = run(&mut session, "Qh4#");
        assert!(out.contains("Game over! Result: 0-1"));

        let (_, out) = run(&mut session, "moves");
        assert_eq!(out, "No legal moves available.\n");
        let (_, out) = run(&mut session, "analyze");
        assert_eq!(out, "The game is over.\n");
    }

    #[test]
    fn engine_commands() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ScriptedLauncher::new();
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        launcher.lines(start, &[("e2e4", Score::Cp(30)), ("d2d4", Score::Cp(25))]);
        let mut session = session(dir.path(), &launcher);

        let (_, out) = run(&mut session, "hint");
        assert_eq!(out, "Hint: e4\n");

        let (_, out) = run(&mut session, "analyze");
        assert!(out.contains("Best move: e4"));
        assert!(out.contains("Evaluation: +0.30"));
        assert!(out.contains("  2. d4 (+0.25)"));

        let (_, out) = run(&mut session, "engine");
        assert!(out.starts_with("Engine: ready"));
        assert!(out.contains("Name: Scripted Engine"));

        let (flow, out) = run(&mut session, "engine live");
        assert_eq!(flow, Flow::ConfigChanged);
        assert!(out.contains("Depth: 10"));

        launcher.kill();
        let (_, out) = run(&mut session, "hint");
        assert_eq!(out, "No hint available.\n");
        let (_, out) = run(&mut session, "quality");
        assert_eq!(out, "Analysis engine is not available\n");
        let (_, out) = run(&mut session, "recover");
        assert_eq!(out, "Engine ready.\n");
    }

    #[test]
    fn recover_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ScriptedLauncher::new();
        launcher.refuse_launches(10);
        let mut session = session(dir.path(), &launcher);

        let (_, out) = run(&mut session, "analyze");
        assert_eq!(out, "Engine analysis not available.\n");
        let (_, out) = run(&mut session, "recover");
        assert_eq!(out, "Engine could not be started.\n");
    }

    #[test]
    fn toggle_and_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());

        let (flow, out) = run(&mut session, "analysis");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, "Engine analysis enabled.\n");

        let (flow, out) = run(&mut session, "set engine.depth 12");
        assert_eq!(flow, Flow::ConfigChanged);
        assert_eq!(out, "Set engine.depth = 12\n");
        assert_eq!(session.config().engine.depth, 12);

        let (flow, out) = run(&mut session, "set engine.depth twelve");
        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with("Invalid value 'twelve' for engine.depth"));

        let (_, out) = run(&mut session, "config");
        assert!(out.contains("engine.depth: 12"));
    }

    #[test]
    fn save_and_report_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());
        run(&mut session, "d4");

        let pgn = dir.path().join("out.pgn");
        let (_, out) = run(&mut session, &format!("save {}", pgn.display()));
        assert_eq!(out, format!("Game saved to {}\n", pgn.display()));
        assert!(pgn.exists());

        let report = dir.path().join("out.txt");
        let (_, out) = run(&mut session, &format!("report {}", report.display()));
        assert_eq!(out, format!("Report saved to {}\n", report.display()));

        let bad = dir.path().join("missing").join("x.pgn");
        let (_, out) = run(&mut session, &format!("save {}", bad.display()));
        assert!(out.starts_with("Save failed: Failed to write"));
    }

    #[test]
    fn quit_and_pgn() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), &ScriptedLauncher::new());
        let (_, out) = run(&mut session, "pgn");
        assert!(out.starts_with("[Event \"Home Game\"]"));
        assert_eq!(run(&mut session, "quit").0, Flow::Quit);
    }
}
