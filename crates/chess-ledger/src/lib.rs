//! Chess game ledger.
//!
//! This crate owns a game's move history and the position it leads to. The
//! rules themselves are injected through [`PositionOracle`]; [`StandardOracle`]
//! binds that contract to standard chess.
//!
//! # Example
//!
//! ```
//! use chess_ledger::{GameOutcome, MoveLedger, StandardOracle};
//!
//! let mut ledger = MoveLedger::new(StandardOracle);
//! ledger.apply("e4").unwrap();
//! ledger.apply("e7e5").unwrap();
//! assert_eq!(ledger.history_as_text(), vec!["e4", "e5"]);
//! assert_eq!(ledger.result(), GameOutcome::InProgress);
//! ```

pub mod ledger;
pub mod oracle;
pub mod standard;

pub use ledger::{GameOutcome, LedgerError, MoveLedger, Ply, Replay};
pub use oracle::{MoveParseError, MoveTraits, PieceKind, PositionOracle, Side};
pub use standard::StandardOracle;
