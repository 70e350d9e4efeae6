//! `info` lines as an analysing GUI reads them.

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance, from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawns (100 = one pawn).
    Cp(i32),
    /// Mate in N moves; negative when the side to move is being mated.
    Mate(i32),
}

/// Set when the engine stopped on an aspiration window edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    Lower,
    Upper,
}

/// The parts of one `info` line the helper cares about. Anything else the
/// engine reports (`currmove`, `hashfull`, `tbhits`, ...) is skipped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    /// Rank of this line when several are requested (1 = best).
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub bound: Option<Bound>,
    pub nodes: Option<u64>,
    /// Milliseconds searched.
    pub time: Option<u64>,
    /// Principal variation in coordinate notation.
    pub pv: Vec<String>,
    /// Free text after `string`.
    pub string: Option<String>,
}

impl EngineInfo {
    /// The line rank, treating a missing `multipv` as the principal line.
    pub fn rank(&self) -> u32 {
        self.multipv.unwrap_or(1)
    }

    /// Parse an `info` line. Returns `None` for any other line. A malformed
    /// number leaves its field unset.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().peekable();
        if tokens.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::default();
        while let Some(token) = tokens.next() {
            match token {
                "depth" => info.depth = number(tokens.next()),
                "seldepth" => info.seldepth = number(tokens.next()),
                "multipv" => info.multipv = number(tokens.next()),
                "nodes" => info.nodes = number(tokens.next()),
                "time" => info.time = number(tokens.next()),
                "score" => {
                    let kind = tokens.next();
                    let value = number(tokens.next());
                    info.score = match (kind, value) {
                        (Some("cp"), Some(cp)) => Some(Score::Cp(cp)),
                        (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                        _ => info.score,
                    };
                }
                "lowerbound" => info.bound = Some(Bound::Lower),
                "upperbound" => info.bound = Some(Bound::Upper),
                "pv" => {
                    while let Some(mv) = tokens.next_if(|t| !is_keyword(t)) {
                        info.pv.push(mv.to_string());
                    }
                }
                "string" => {
                    info.string = Some(tokens.by_ref().collect::<Vec<_>>().join(" "));
                }
                _ => {}
            }
        }

        Some(info)
    }
}

fn number<T: std::str::FromStr>(token: Option<&str>) -> Option<T> {
    token.and_then(|t| t.parse().ok())
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "lowerbound"
            | "upperbound"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "tbhits"
            | "string"
    )
}
