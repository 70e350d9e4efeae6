//! In-memory scripted engine for tests.
//!
//! Scores are scripted per FEN from White's point of view and converted to
//! the engine convention (side to move) on the way out, so tests read like
//! the evaluations they expect. A mate score of zero is passed through as
//! is: it always means the side to move is mated.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use uci::{EngineInfo, Score, SearchReport, UciError};

use crate::adapter::{AnalysisBackend, EngineLauncher};
use crate::engine::{EngineError, EngineSettings};

#[derive(Debug, Default)]
struct Script {
    scores: HashMap<String, Score>,
    lines: HashMap<String, Vec<(String, Score)>>,
    failing: HashSet<String>,
    refused_launches: usize,
    launches: usize,
    kill_below: usize,
    launched_paths: Vec<PathBuf>,
    configured: Vec<EngineSettings>,
    searches: usize,
    last_go: Option<(String, u32)>,
}

/// Launches [`ScriptedEngine`]s that share one script.
///
/// Clones share the script, so a test keeps one handle and gives another
/// to the adapter.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncher {
    script: Rc<RefCell<Script>>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score for `fen`, White-relative.
    pub fn score(&self, fen: &str, score: Score) {
        self.script.borrow_mut().scores.insert(fen.to_string(), score);
    }

    /// Ranked lines for `fen` as (coordinate move, White-relative score).
    pub fn lines(&self, fen: &str, lines: &[(&str, Score)]) {
        let lines = lines.iter().map(|(m, s)| (m.to_string(), *s)).collect();
        self.script.borrow_mut().lines.insert(fen.to_string(), lines);
    }

    /// Searching `fen` kills the engine.
    pub fn fail_on(&self, fen: &str) {
        self.script.borrow_mut().failing.insert(fen.to_string());
    }

    /// Refuse the next `n` launches.
    pub fn refuse_launches(&self, n: usize) {
        self.script.borrow_mut().refused_launches = n;
    }

    /// Kill every engine launched so far.
    pub fn kill(&self) {
        let mut script = self.script.borrow_mut();
        script.kill_below = script.launches;
    }

    /// Launch attempts, refused ones included.
    pub fn launches(&self) -> usize {
        self.script.borrow().launches
    }

    pub fn launched_paths(&self) -> Vec<PathBuf> {
        self.script.borrow().launched_paths.clone()
    }

    /// Every settings value pushed to an engine, in order.
    pub fn configured(&self) -> Vec<EngineSettings> {
        self.script.borrow().configured.clone()
    }

    pub fn searches(&self) -> usize {
        self.script.borrow().searches
    }

    pub fn last_go_fen(&self) -> Option<String> {
        self.script.borrow().last_go.as_ref().map(|(fen, _)| fen.clone())
    }

    /// Number of lines requested by the last search.
    pub fn last_lines(&self) -> Option<u32> {
        self.script.borrow().last_go.as_ref().map(|(_, lines)| *lines)
    }
}

impl EngineLauncher for ScriptedLauncher {
    type Backend = ScriptedEngine;

    fn launch(&self, program: &Path) -> Result<ScriptedEngine, EngineError> {
        let mut script = self.script.borrow_mut();
        let id = script.launches;
        script.launches += 1;
        if script.refused_launches > 0 {
            script.refused_launches -= 1;
            return Err(EngineError::NotFound(program.to_path_buf()));
        }
        script.launched_paths.push(program.to_path_buf());
        Ok(ScriptedEngine {
            id,
            depth: 0,
            script: Rc::clone(&self.script),
        })
    }
}

/// One scripted engine session.
#[derive(Debug)]
pub struct ScriptedEngine {
    id: usize,
    depth: u32,
    script: Rc<RefCell<Script>>,
}

impl ScriptedEngine {
    fn check_alive(&self) -> Result<(), EngineError> {
        if self.id < self.script.borrow().kill_below {
            return Err(EngineError::Uci(UciError::Closed));
        }
        Ok(())
    }
}

/// White-relative score as the engine would print it for `fen`.
fn engine_score(fen: &str, score: Score) -> Score {
    let black_to_move = fen.split_whitespace().nth(1) == Some("b");
    match score {
        Score::Cp(cp) if black_to_move => Score::Cp(cp.saturating_neg()),
        Score::Mate(n) if black_to_move => Score::Mate(n.saturating_neg()),
        other => other,
    }
}

impl AnalysisBackend for ScriptedEngine {
    fn name(&self) -> &str {
        "Scripted Engine"
    }

    fn ping(&mut self) -> Result<(), EngineError> {
        self.check_alive()
    }

    fn configure(&mut self, settings: &EngineSettings) -> Result<(), EngineError> {
        self.check_alive()?;
        self.depth = settings.depth;
        self.script.borrow_mut().configured.push(settings.clone());
        Ok(())
    }

    fn search(&mut self, fen: &str, lines: u32) -> Result<SearchReport, EngineError> {
        self.check_alive()?;
        let mut script = self.script.borrow_mut();
        script.searches += 1;
        script.last_go = Some((fen.to_string(), lines));

        if script.failing.contains(fen) {
            script.kill_below = script.launches;
            return Err(EngineError::Uci(UciError::Closed));
        }

        let info = |rank: usize, score: Score, pv: Vec<String>| EngineInfo {
            depth: Some(self.depth),
            multipv: Some(rank as u32 + 1),
            score: Some(engine_score(fen, score)),
            pv,
            ..EngineInfo::default()
        };

        let lines: Vec<EngineInfo> = match (script.lines.get(fen), script.scores.get(fen)) {
            (Some(scripted), _) => scripted
                .iter()
                .take(lines as usize)
                .enumerate()
                .map(|(rank, (mv, score))| info(rank, *score, vec![mv.clone()]))
                .collect(),
            (None, Some(score)) => vec![info(0, *score, Vec::new())],
            (None, None) => Vec::new(),
        };

        Ok(SearchReport {
            best_move: lines.first().and_then(|l| l.pv.first().cloned()),
            ponder: None,
            lines,
        })
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.check_alive()
    }
}
