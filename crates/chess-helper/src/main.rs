use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chess_analysis::EnginePreset;
use chess_helper::command::{execute, move_tokens, Command, Flow};
use chess_helper::config::{HelperConfig, DEFAULT_CONFIG_FILE};
use chess_helper::report::{to_report, write_report};
use chess_helper::session::HelperSession;
use clap::{Parser, Subcommand};
use tracing::{warn, Level};

#[derive(Parser)]
#[command(name = "chess-helper")]
#[command(about = "Engine-assisted companion for over-the-board chess games")]
struct Cli {
    /// Path to the engine executable, overriding the config file
    #[arg(long, global = true)]
    engine_path: Option<PathBuf>,
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a game interactively (the default)
    Play,
    /// Analyze a game given as a move list
    Analyze {
        /// Moves in SAN or coordinate notation; move numbers are skipped
        #[arg(required = true)]
        moves: Vec<String>,
        /// Print the summary as JSON instead of the text report
        #[arg(long)]
        json: bool,
        /// Also write the text report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Use the deep analysis preset
        #[arg(long)]
        deep: bool,
    },
    /// Show or change the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print every setting
    Show,
    /// Change one setting and save the file
    Set { key: String, value: String },
    /// Write the default settings
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HelperConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config.log_level, cli.verbose);

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => play(config, &cli.config, cli.engine_path),
        Commands::Analyze {
            moves,
            json,
            output,
            deep,
        } => {
            let mut config = config;
            if let Some(path) = cli.engine_path {
                config.engine.path = Some(path);
            }
            analyze(config, &moves, json, output.as_deref(), deep)
        }
        Commands::Config { action } => configure(config, &cli.config, action),
    }
}

fn init_tracing(level: &str, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        level.parse().unwrap_or(Level::WARN)
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn play(config: HelperConfig, config_path: &Path, engine_path: Option<PathBuf>) -> Result<()> {
    // The command-line engine path is used for this run but not saved.
    let file_engine_path = config.engine.path.clone();
    let mut session_config = config;
    if let Some(path) = &engine_path {
        session_config.engine.path = Some(path.clone());
    }
    let mut session = HelperSession::new(session_config);

    println!("Welcome to Chess Helper!");
    println!("Type 'help' for available commands.");
    if !session.engine_available() {
        println!("\nWarning: no analysis engine could be started.");
        println!("Download Stockfish from https://stockfishchess.org/download/");
        println!("or set its location with 'set engine.path <file>', then 'recover'.");
    }
    println!("\n{}", session.position_info());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nChess Helper> ");
        stdout.flush()?;
        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let command = match Command::parse(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(&mut session, command, &mut stdout)? {
            Flow::Continue => {}
            Flow::ConfigChanged => {
                let mut saved = session.config().clone();
                if engine_path.is_some() && saved.engine.path == engine_path {
                    saved.engine.path = file_engine_path.clone();
                }
                if let Err(e) = saved.save(config_path) {
                    warn!(error = %e, "Could not save settings");
                    println!("Warning: settings not saved: {}", e);
                }
            }
            Flow::Quit => break,
        }
    }

    println!("Thanks for using Chess Helper!");
    Ok(())
}

fn analyze(
    mut config: HelperConfig,
    moves: &[String],
    json: bool,
    output: Option<&Path>,
    deep: bool,
) -> Result<()> {
    config.game.auto_analysis = false;
    config.game.auto_save = false;
    let mut session = HelperSession::new(config);
    if deep {
        session.apply_preset(EnginePreset::Deep);
    }

    for (i, token) in move_tokens(moves).iter().enumerate() {
        session
            .play(token)
            .with_context(|| format!("Move {} ({}) could not be played", i + 1, token))?;
    }

    let summary = session.summary();
    if summary.quality.is_none() {
        eprintln!("Warning: analysis engine unavailable, move quality skipped");
    }
    let report = to_report(
        session.ledger(),
        &summary.statistics,
        summary.quality.as_ref(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", report);
    }

    if let Some(path) = output {
        write_report(path, &report)?;
        eprintln!("Report saved to {}", path.display());
    }
    Ok(())
}

fn configure(mut config: HelperConfig, path: &Path, action: Option<ConfigAction>) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => println!("{}", config),
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save(path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Reset => {
            HelperConfig::default().save(path)?;
            println!("Configuration reset to defaults");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_defaults_to_play() {
        let cli = Cli::try_parse_from(["chess-helper"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("chess_helper.toml"));
        assert!(cli.engine_path.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parses_global_options() {
        let cli = Cli::try_parse_from([
            "chess-helper",
            "play",
            "--engine-path",
            "/opt/stockfish",
            "-c",
            "other.toml",
            "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Play)));
        assert_eq!(cli.engine_path, Some(PathBuf::from("/opt/stockfish")));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parses_analyze_command() {
        let cli = Cli::try_parse_from([
            "chess-helper",
            "analyze",
            "1.",
            "e4",
            "e5",
            "O-O",
            "1-0",
            "--json",
            "-o",
            "report.txt",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Analyze {
                moves,
                json,
                output,
                deep,
            }) => {
                assert_eq!(moves, vec!["1.", "e4", "e5", "O-O", "1-0"]);
                assert!(json);
                assert_eq!(output, Some(PathBuf::from("report.txt")));
                assert!(!deep);
            }
            _ => panic!("Expected analyze command"),
        }
    }

    #[test]
    fn test_cli_analyze_requires_moves() {
        assert!(Cli::try_parse_from(["chess-helper", "analyze"]).is_err());
    }

    #[test]
    fn test_cli_parses_config_set() {
        let cli =
            Cli::try_parse_from(["chess-helper", "config", "set", "engine.depth", "18"]).unwrap();
        match cli.command {
            Some(Commands::Config {
                action: Some(ConfigAction::Set { key, value }),
            }) => {
                assert_eq!(key, "engine.depth");
                assert_eq!(value, "18");
            }
            _ => panic!("Expected config set command"),
        }
    }

    #[test]
    fn test_configure_set_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helper.toml");

        configure(
            HelperConfig::default(),
            &path,
            Some(ConfigAction::Set {
                key: "game.autosave_interval".to_string(),
                value: "6".to_string(),
            }),
        )
        .unwrap();

        let saved = HelperConfig::load(&path).unwrap();
        assert_eq!(saved.game.autosave_interval, 6);

        let rejected = configure(
            saved,
            &path,
            Some(ConfigAction::Set {
                key: "nope".to_string(),
                value: "1".to_string(),
            }),
        );
        assert!(rejected.is_err());
    }

    #[test]
    fn test_configure_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helper.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();

        configure(HelperConfig::load(&path).unwrap(), &path, Some(ConfigAction::Reset)).unwrap();
        assert_eq!(HelperConfig::load(&path).unwrap(), HelperConfig::default());
    }

    #[test]
    fn test_cli_help_lists_subcommands() {
        let mut cmd = Cli::command();
        let help = cmd.render_help().to_string();
        assert!(help.contains("analyze"));
        assert!(help.contains("config"));
    }
}
