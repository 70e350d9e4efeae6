//! Standard chess rules, provided by `shakmaty`.

use shakmaty::{
    fen::Fen,
    san::{San, SanError},
    uci::UciMove,
    CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role,
};

use crate::oracle::{MoveParseError, MoveTraits, PieceKind, PositionOracle, Side};

/// Standard chess (FIDE) rules from the initial position.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardOracle;

impl StandardOracle {
    fn parse_san(&self, position: &Chess, text: &str) -> Result<Move, MoveParseError> {
        let cleaned = normalize_san(text);
        let san: San = cleaned
            .parse()
            .map_err(|_| MoveParseError::Malformed(text.to_string()))?;
        san.to_move(position).map_err(|e| match e {
            SanError::AmbiguousSan => MoveParseError::Ambiguous(text.to_string()),
            _ => MoveParseError::Illegal(text.to_string()),
        })
    }
}

/// Drop check, mate and annotation suffixes, and accept zeros in castling.
fn normalize_san(text: &str) -> String {
    let trimmed = text.trim().trim_end_matches(['+', '#', '!', '?']);
    match trimmed {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}

impl From<Color> for Side {
    fn from(c: Color) -> Self {
        match c {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Role> for PieceKind {
    fn from(r: Role) -> Self {
        match r {
            Role::Pawn => PieceKind::Pawn,
            Role::Knight => PieceKind::Knight,
            Role::Bishop => PieceKind::Bishop,
            Role::Rook => PieceKind::Rook,
            Role::Queen => PieceKind::Queen,
            Role::King => PieceKind::King,
        }
    }
}

impl PositionOracle for StandardOracle {
    type Position = Chess;
    type Move = Move;

    fn initial_position(&self) -> Chess {
        Chess::default()
    }

    fn legal_moves(&self, position: &Chess) -> Vec<Move> {
        position.legal_moves().into_iter().collect()
    }

    /// Accepts SAN first and falls back to coordinate notation.
    fn parse_move(&self, position: &Chess, text: &str) -> Result<Move, MoveParseError> {
        match self.parse_san(position, text) {
            Ok(mv) => Ok(mv),
            Err(MoveParseError::Ambiguous(s)) => Err(MoveParseError::Ambiguous(s)),
            Err(san_err) => self.parse_uci(position, text).map_err(|uci_err| {
                // A well-formed SAN that is illegal says more than a UCI parse failure.
                match (san_err, uci_err) {
                    (MoveParseError::Malformed(_), uci_err) => uci_err,
                    (san_err, _) => san_err,
                }
            }),
        }
    }

    fn parse_uci(&self, position: &Chess, text: &str) -> Result<Move, MoveParseError> {
        let uci: UciMove = text
            .trim()
            .parse()
            .map_err(|_| MoveParseError::Malformed(text.to_string()))?;
        uci.to_move(position)
            .map_err(|_| MoveParseError::Illegal(text.to_string()))
    }

    fn apply(&self, position: &Chess, mv: &Move) -> Chess {
        let mut next = position.clone();
        next.play_unchecked(mv);
        next
    }

    fn to_fen(&self, position: &Chess) -> String {
        Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
    }

    fn to_san(&self, position: &Chess, mv: &Move) -> String {
        let mut san = San::from_move(position, mv).to_string();
        let after = self.apply(position, mv);
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
        san
    }

    fn to_uci(&self, mv: &Move) -> String {
        UciMove::from_move(mv, CastlingMode::Standard).to_string()
    }

    fn side_to_move(&self, position: &Chess) -> Side {
        position.turn().into()
    }

    fn is_check(&self, position: &Chess) -> bool {
        position.is_check()
    }

    fn is_checkmate(&self, position: &Chess) -> bool {
        position.is_checkmate()
    }

    fn is_stalemate(&self, position: &Chess) -> bool {
        position.is_stalemate()
    }

    fn is_insufficient_material(&self, position: &Chess) -> bool {
        position.is_insufficient_material()
    }

    fn move_traits(&self, _position: &Chess, mv: &Move) -> MoveTraits {
        MoveTraits {
            capture: mv.is_capture(),
            castle: mv.is_castle(),
            promotion: mv.is_promotion(),
        }
    }

    fn pieces(&self, position: &Chess) -> Vec<(Side, PieceKind)> {
        let board = position.board();
        board
            .occupied()
            .into_iter()
            .filter_map(|sq| board.piece_at(sq))
            .map(|piece| (piece.color.into(), piece.role.into()))
            .collect()
    }
}
