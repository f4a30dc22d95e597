//! Applying moves to positions

use crate::board::Position;
use crate::geometry;
use crate::legal;
use crate::moves::base::Move;
use crate::types::{CastlingSide, Color, File, Piece, PieceKind, Square};

use std::collections::BTreeMap;

impl Position {
    /// Applies an already-calculated move, producing the next position
    ///
    /// The returned position has the side to move flipped, clocks and
    /// castling rights brought up to date, the en-passant window re-set or
    /// cleared, the move appended to its history, and its legal-move table
    /// fully computed.
    ///
    /// # Panics
    ///
    /// Panics if the piece at `mv.from()` is not the piece recorded in the
    /// move. That means `mv` was calculated against a different (stale)
    /// position, which is a caller bug.
    pub fn apply_move(&self, mv: &Move) -> Position {
        apply_move(self, mv)
    }
}

pub(crate) fn apply_move(pos: &Position, mv: &Move) -> Position {
    if pos.get(mv.from()) != Some(mv.piece()) {
        panic!(
            "move {} does not match the board: expected {:?} at {}",
            mv,
            mv.piece(),
            mv.from()
        );
    }

    let color = mv.color();
    let captured = pos.get(mv.to());

    let mut cells = pos.cells.clone();
    cells.remove(&mv.from());
    cells.remove(&mv.to());
    if mv.is_en_passant() {
        let fwd = geometry::pawn_forward_delta(color);
        if let Some(sq) = mv.to().try_shift(0, -fwd) {
            cells.remove(&sq);
        }
    }
    let placed = match mv.promotion() {
        Some(p) => Piece::new(color, p.into()),
        None => mv.piece(),
    };
    cells.insert(mv.to(), placed);

    let mut castling = pos.castling;
    if let Some(cside) = mv.castling() {
        let rank = geometry::castling_rank(color);
        let (rook_from, rook_to) = match cside {
            CastlingSide::King => (File::H, File::F),
            CastlingSide::Queen => (File::A, File::D),
        };
        if let Some(rook) = cells.remove(&Square::from_parts(rook_from, rank)) {
            cells.insert(Square::from_parts(rook_to, rank), rook);
        }
        castling.unset_color(color);
    }
    match mv.piece().kind {
        PieceKind::King => castling.unset_color(color),
        PieceKind::Rook => {
            let rank = geometry::castling_rank(color);
            if mv.from() == Square::from_parts(File::A, rank) {
                castling.unset(color, CastlingSide::Queen);
            }
            if mv.from() == Square::from_parts(File::H, rank) {
                castling.unset(color, CastlingSide::King);
            }
        }
        _ => {}
    }
    // a rook captured on its home corner also forfeits that wing
    if captured == Some(Piece::new(color.inv(), PieceKind::Rook)) {
        let rank = geometry::castling_rank(color.inv());
        if mv.to() == Square::from_parts(File::A, rank) {
            castling.unset(color.inv(), CastlingSide::Queen);
        }
        if mv.to() == Square::from_parts(File::H, rank) {
            castling.unset(color.inv(), CastlingSide::King);
        }
    }

    let ep_target = if mv.piece().kind == PieceKind::Pawn
        && mv.from().rank() == geometry::pawn_home_rank(color)
        && mv.to().rank() == geometry::double_move_dst_rank(color)
    {
        mv.from().try_shift(0, geometry::pawn_forward_delta(color))
    } else {
        None
    };

    let halfmove_clock = if mv.piece().kind == PieceKind::Pawn || mv.is_capture() {
        0
    } else {
        pos.halfmove_clock + 1
    };
    let fullmove_number = match color {
        Color::White => pos.fullmove_number,
        Color::Black => pos.fullmove_number + 1,
    };

    let mut history = pos.history.clone();
    history.push(mv.clone());

    let mut next = Position {
        cells,
        side: color.inv(),
        castling,
        ep_target,
        halfmove_clock,
        fullmove_number,
        history,
        allowed: BTreeMap::new(),
    };
    legal::fill_allowed_moves(&mut next);
    next
}
