//! Commands sent from the GUI side to an engine.

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Tell the engine the next search belongs to a new game.
    UciNewGame,
    /// Change an engine option.
    SetOption { name: String, value: String },
    /// Set up the position to analyse.
    Position { fen: String },
    /// Start calculating.
    Go(GoOptions),
    /// Quit the engine.
    Quit,
}

/// Limits for the `go` command. Every search the helper runs is bounded by
/// depth, optionally with a time cap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search for at most this time in milliseconds.
    pub movetime: Option<u64>,
    /// Search to this depth.
    pub depth: Option<u32>,
}

impl GoOptions {
    /// Search to a fixed depth.
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// Adds a wall-clock budget in milliseconds.
    pub fn with_movetime(mut self, ms: u64) -> Self {
        self.movetime = Some(ms);
        self
    }

    fn to_uci(&self) -> String {
        let mut line = String::from("go");
        if let Some(d) = self.depth {
            line.push_str(&format!(" depth {}", d));
        }
        if let Some(ms) = self.movetime {
            line.push_str(&format!(" movetime {}", ms));
        }
        line
    }
}

impl GuiCommand {
    /// Format the command as a single UCI line (without newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::UciNewGame => "ucinewgame".to_string(),
            GuiCommand::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            GuiCommand::Position { fen } => format!("position fen {}", fen),
            GuiCommand::Go(opts) => opts.to_uci(),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}
