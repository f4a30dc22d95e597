//! Algebraic move notation
//!
//! Generation renders a [`Move`] the way an interactive move list shows
//! it: `O-O`, `Nf3`, `exd5`, `a8=Q`. Check and checkmate suffixes are not
//! generated (the engine does not classify check states for annotation),
//! and no disambiguation characters are emitted.
//!
//! Parsing accepts the full grammar, including origin-file/rank
//! disambiguation and trailing `+`/`#` marks, and resolves the text back to
//! a unique legal [`Move`] against a given position.

use crate::board::Position;
use crate::geometry;
use crate::moves::base::{Move, MoveError, PromotePiece};
use crate::types::{CastlingSide, File, Piece, PieceKind, Rank, Square};

use std::str::{self, FromStr};

use arrayvec::ArrayVec;
use thiserror::Error;

/// Error resolving algebraic text into a [`Move`]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum AlgebraicParseError {
    /// The described move exists but is not playable (wrong turn, own
    /// piece on the destination, or illegal for the piece)
    #[error(transparent)]
    Move(#[from] MoveError),
    /// The text is not well-formed algebraic notation, or contradicts the
    /// board (e.g. a capture sign on a non-capture)
    #[error("invalid algebraic notation {0:?}")]
    InvalidNotation(String),
    /// More than one piece of the named kind can legally make the move
    #[error("ambiguous algebraic notation {0:?} for {1:?}")]
    Ambiguous(String, PieceKind),
}

/// Renders the algebraic text for a move's components
pub(crate) fn algebraic_text(
    kind: PieceKind,
    from: Square,
    to: Square,
    capture: bool,
    castling: Option<CastlingSide>,
    promotion: Option<PromotePiece>,
) -> String {
    match castling {
        Some(CastlingSide::King) => return "O-O".to_string(),
        Some(CastlingSide::Queen) => return "O-O-O".to_string(),
        None => {}
    }
    let mut res = String::new();
    if kind == PieceKind::Pawn {
        if capture {
            res.push(from.file().as_char());
        }
    } else {
        res.push(kind.as_char());
    }
    if capture {
        res.push('x');
    }
    res.push(to.file().as_char());
    res.push(to.rank().as_char());
    if let Some(p) = promotion {
        res.push('=');
        res.push(PieceKind::from(p).as_char());
    }
    res
}

impl Move {
    /// Resolves algebraic text like `Nf3`, `exd5` or `O-O` against `pos`
    ///
    /// The result is a fully legal move: candidates are checked against the
    /// position's legal-move table, so check safety is already obeyed.
    /// Trailing `+`/`#` marks are accepted but not verified.
    pub fn from_algebraic(pos: &Position, text: &str) -> Result<Move, AlgebraicParseError> {
        from_algebraic(pos, text)
    }
}

pub(crate) fn from_algebraic(pos: &Position, text: &str) -> Result<Move, AlgebraicParseError> {
    let invalid = || AlgebraicParseError::InvalidNotation(text.to_string());

    if !text.is_ascii() {
        return Err(invalid());
    }
    let mut bytes = text.as_bytes();
    while let Some((b'+' | b'#', rest)) = bytes.split_last() {
        bytes = rest;
    }
    if bytes.is_empty() {
        return Err(invalid());
    }

    match bytes {
        b"O-O" | b"0-0" => return castling_move(pos, CastlingSide::King),
        b"O-O-O" | b"0-0-0" => return castling_move(pos, CastlingSide::Queen),
        _ => {}
    }

    match bytes[0] {
        b'N' | b'B' | b'R' | b'Q' | b'K' => piece_move(pos, bytes, text),
        _ => pawn_move(pos, bytes, text),
    }
}

fn castling_move(pos: &Position, side: CastlingSide) -> Result<Move, AlgebraicParseError> {
    let color = pos.side();
    let rank = geometry::castling_rank(color);
    let from = Square::from_parts(File::E, rank);
    if pos.get(from) != Some(Piece::new(color, PieceKind::King)) {
        return Err(MoveError::InvalidPieceMove(PieceKind::King).into());
    }
    let to_file = match side {
        CastlingSide::King => File::G,
        CastlingSide::Queen => File::C,
    };
    let to = Square::from_parts(to_file, rank);
    Ok(Move::from_squares(pos, from, to, None)?)
}

fn piece_move(pos: &Position, bytes: &[u8], text: &str) -> Result<Move, AlgebraicParseError> {
    let invalid = || AlgebraicParseError::InvalidNotation(text.to_string());

    let kind = match bytes[0] {
        b'N' => PieceKind::Knight,
        b'B' => PieceKind::Bishop,
        b'R' => PieceKind::Rook,
        b'Q' => PieceKind::Queen,
        b'K' => PieceKind::King,
        _ => unreachable!(),
    };
    let bytes = &bytes[1..];
    if bytes.len() < 2 {
        return Err(invalid());
    }
    let (bytes, dst_bytes) = bytes.split_at(bytes.len() - 2);
    let dst =
        Square::from_str(str::from_utf8(dst_bytes).unwrap()).map_err(|_| invalid())?;
    let (file, bytes) = match bytes.first() {
        Some(b @ b'a'..=b'h') => (File::from_char(*b as char), &bytes[1..]),
        _ => (None, bytes),
    };
    let (rank, bytes) = match bytes.first() {
        Some(b @ b'1'..=b'8') => (Rank::from_char(*b as char), &bytes[1..]),
        _ => (None, bytes),
    };
    let (capture_sign, bytes) = match bytes.first() {
        Some(b'x') => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    if !bytes.is_empty() {
        return Err(invalid());
    }

    let mut candidates = candidate_origins(pos, kind, dst);
    candidates.retain(|sq| {
        file.map_or(true, |f| sq.file() == f) && rank.map_or(true, |r| sq.rank() == r)
    });
    let mv = match candidates.len() {
        0 => return Err(MoveError::InvalidPieceMove(kind).into()),
        1 => Move::from_squares(pos, candidates[0], dst, None)?,
        _ => {
            let mut resolved: Option<Move> = None;
            for &from in &candidates {
                if let Ok(mv) = Move::from_squares(pos, from, dst, None) {
                    if resolved.is_some() {
                        return Err(AlgebraicParseError::Ambiguous(text.to_string(), kind));
                    }
                    resolved = Some(mv);
                }
            }
            resolved.ok_or(MoveError::InvalidPieceMove(kind))?
        }
    };
    if capture_sign && !mv.is_capture() {
        return Err(invalid());
    }
    Ok(mv)
}

/// Finds the same-kind friendly pieces that could geometrically reach
/// `dst`, by casting rays (sliders) or fixed offsets (knight, king) back
/// from the destination
fn candidate_origins(pos: &Position, kind: PieceKind, dst: Square) -> ArrayVec<Square, 8> {
    const DIAG: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
    const LINE: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const ALL: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 1),
        (1, -1),
        (1, 1),
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
    ];
    const KNIGHT: [(isize, isize); 8] = [
        (-2, -1),
        (-2, 1),
        (-1, -2),
        (-1, 2),
        (1, -2),
        (1, 2),
        (2, -1),
        (2, 1),
    ];
    const KING: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    let wanted = Piece::new(pos.side(), kind);
    let mut res = ArrayVec::new();
    match kind {
        PieceKind::Knight | PieceKind::King => {
            let offsets: &[(isize, isize)] = if kind == PieceKind::Knight {
                &KNIGHT
            } else {
                &KING
            };
            for &(df, dr) in offsets {
                if let Some(sq) = dst.try_shift(df, dr) {
                    if pos.get(sq) == Some(wanted) {
                        res.push(sq);
                    }
                }
            }
        }
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            let dirs: &[(isize, isize)] = match kind {
                PieceKind::Bishop => &DIAG,
                PieceKind::Rook => &LINE,
                _ => &ALL,
            };
            for &(df, dr) in dirs {
                let mut sq = dst;
                while let Some(next) = sq.try_shift(df, dr) {
                    sq = next;
                    match pos.get(sq) {
                        None => continue,
                        Some(p) => {
                            if p == wanted {
                                res.push(sq);
                            }
                            break;
                        }
                    }
                }
            }
        }
        PieceKind::Pawn => {}
    }
    res
}

fn pawn_move(pos: &Position, bytes: &[u8], text: &str) -> Result<Move, AlgebraicParseError> {
    let invalid = || AlgebraicParseError::InvalidNotation(text.to_string());

    let (promote, bytes) = match bytes.split_last() {
        Some((b @ (b'N' | b'B' | b'R' | b'Q'), rest)) => {
            let promote = match b {
                b'N' => PromotePiece::Knight,
                b'B' => PromotePiece::Bishop,
                b'R' => PromotePiece::Rook,
                _ => PromotePiece::Queen,
            };
            match rest.split_last() {
                Some((b'=', rest)) => (Some(promote), rest),
                _ => return Err(invalid()),
            }
        }
        _ => (None, bytes),
    };

    if bytes.len() < 2 {
        return Err(invalid());
    }
    let (prefix, dst_bytes) = bytes.split_at(bytes.len() - 2);
    let dst =
        Square::from_str(str::from_utf8(dst_bytes).unwrap()).map_err(|_| invalid())?;

    let color = pos.side();
    let fwd = geometry::pawn_forward_delta(color);
    let pawn = Piece::new(color, PieceKind::Pawn);

    let from = match prefix {
        [] => {
            let behind = dst.try_shift(0, -fwd).ok_or_else(invalid)?;
            if pos.get(behind).is_none() && dst.rank() == geometry::double_move_dst_rank(color) {
                Square::from_parts(dst.file(), geometry::pawn_home_rank(color))
            } else {
                behind
            }
        }
        [f @ b'a'..=b'h', b'x'] => {
            // the capture sign must match the board
            if pos.get(dst).is_none() && pos.ep_target() != Some(dst) {
                return Err(invalid());
            }
            let src_file = File::from_char(*f as char).unwrap();
            Square::from_parts(src_file, dst.rank())
                .try_shift(0, -fwd)
                .ok_or_else(invalid)?
        }
        _ => return Err(invalid()),
    };
    if pos.get(from) != Some(pawn) {
        return Err(MoveError::InvalidPieceMove(PieceKind::Pawn).into());
    }

    let mv = Move::from_squares(pos, from, dst, promote)?;
    if promote.is_some() && mv.promotion().is_none() {
        // a promotion suffix aimed at a non-final rank is leftover text
        return Err(invalid());
    }
    Ok(mv)
}
