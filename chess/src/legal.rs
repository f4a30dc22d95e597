//! Legal move filter
//!
//! Fills the per-origin table of legal destination squares on a freshly
//! built [`Position`]. A destination is legal when the piece-shape rules
//! accept it and applying it does not leave the mover's own king attacked,
//! which is established by simulating the move on a cloned position and
//! scanning every opposing piece for a reply onto the king's square.
//!
//! The scan is quadratic in squares and pieces. The board is fixed at 64
//! squares and the filter runs once per ply, not in a hot loop.

use crate::board::Position;
use crate::geometry;
use crate::moves::base::{self, Move};
use crate::types::{CastlingSide, Color, File, Piece, PieceKind, Square};

use std::collections::BTreeMap;

use arrayvec::ArrayVec;

/// List of destination squares for a single piece
///
/// The capacity is the mobility of a centralized queen, which no piece
/// exceeds.
pub type SquareList = ArrayVec<Square, 27>;

/// Computes the legal-destination table of `pos`
///
/// # Panics
///
/// Panics if the table is already filled; positions are immutable once
/// their table is computed.
pub(crate) fn fill_allowed_moves(pos: &mut Position) {
    assert!(
        pos.allowed.is_empty(),
        "legal moves are already computed for this position"
    );
    let side = pos.side;
    let mut allowed = BTreeMap::new();
    {
        let p: &Position = pos;
        for (&from, &piece) in &p.cells {
            if piece.color != side {
                continue;
            }
            let mut dests = SquareList::new();
            for to in Square::iter() {
                let mv = match base::calc_raw(p, from, to, None, side) {
                    Ok(mv) => mv,
                    Err(_) => continue,
                };
                if let Some(cside) = mv.castling() {
                    if !castle_path_safe(p, side, cside) {
                        continue;
                    }
                }
                let trial = simulate(p, &mv);
                let safe = match trial.king_square(side) {
                    Some(king) => !is_square_attacked(&trial, king, side.inv()),
                    None => true,
                };
                if safe {
                    dests.push(to);
                }
            }
            if !dests.is_empty() {
                allowed.insert(from, dests);
            }
        }
    }
    pos.allowed = allowed;
}

/// Returns `true` if any piece of color `by` attacks `target`
///
/// Pawns are special-cased: they attack diagonally whether or not the
/// target square is occupied, which matters when probing the empty squares
/// a castling king passes over. Every other piece reaches a square exactly
/// when the move calculator accepts the move, castling excluded.
pub(crate) fn is_square_attacked(pos: &Position, target: Square, by: Color) -> bool {
    pos.cells.iter().any(|(&from, &piece)| {
        if piece.color != by {
            return false;
        }
        match piece.kind {
            PieceKind::Pawn => {
                let fwd = geometry::pawn_forward_delta(by);
                from.try_shift(-1, fwd) == Some(target) || from.try_shift(1, fwd) == Some(target)
            }
            _ => matches!(
                base::calc_raw(pos, from, target, None, by),
                Ok(mv) if mv.castling().is_none()
            ),
        }
    })
}

/// A castle is pruned when the king starts in check or would pass over an
/// attacked square; the landing square is covered by the generic
/// simulate-and-scan step
fn castle_path_safe(pos: &Position, color: Color, side: CastlingSide) -> bool {
    let rank = geometry::castling_rank(color);
    let king = Square::from_parts(File::E, rank);
    let passed_file = match side {
        CastlingSide::King => File::F,
        CastlingSide::Queen => File::D,
    };
    let enemy = color.inv();
    !is_square_attacked(pos, king, enemy)
        && !is_square_attacked(pos, Square::from_parts(passed_file, rank), enemy)
}

/// Applies the raw board effects of `mv` to a clone of `pos`
///
/// Only the piece layout is brought up to date (relocation, capture and
/// en-passant removal, promotion placement, castling rook shift); clocks,
/// rights and turn are irrelevant to the check scan and stay as they were.
fn simulate(pos: &Position, mv: &Move) -> Position {
    let mut cells = pos.cells.clone();
    cells.remove(&mv.from());
    cells.remove(&mv.to());
    if mv.is_en_passant() {
        let fwd = geometry::pawn_forward_delta(mv.color());
        if let Some(captured) = mv.to().try_shift(0, -fwd) {
            cells.remove(&captured);
        }
    }
    let placed = match mv.promotion() {
        Some(p) => Piece::new(mv.color(), p.into()),
        None => mv.piece(),
    };
    cells.insert(mv.to(), placed);
    if let Some(cside) = mv.castling() {
        let rank = geometry::castling_rank(mv.color());
        let (rook_from, rook_to) = match cside {
            CastlingSide::King => (File::H, File::F),
            CastlingSide::Queen => (File::A, File::D),
        };
        if let Some(rook) = cells.remove(&Square::from_parts(rook_from, rank)) {
            cells.insert(Square::from_parts(rook_to, rank), rook);
        }
    }
    Position {
        cells,
        side: pos.side,
        castling: pos.castling,
        ep_target: pos.ep_target,
        halfmove_clock: pos.halfmove_clock,
        fullmove_number: pos.fullmove_number,
        history: Vec::new(),
        allowed: BTreeMap::new(),
    }
}
