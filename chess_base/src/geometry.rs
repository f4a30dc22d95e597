use crate::types::{Color, Rank};

pub const fn castling_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R1,
        Color::Black => Rank::R8,
    }
}

pub const fn pawn_home_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R2,
        Color::Black => Rank::R7,
    }
}

pub const fn double_move_dst_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R4,
        Color::Black => Rank::R5,
    }
}

pub const fn promote_dst_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R8,
        Color::Black => Rank::R1,
    }
}

/// Rank of the square a double-advancing pawn of color `c` passes over,
/// i.e. the rank of a valid en-passant target while `c.inv()` is to move
pub const fn enpassant_target_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R3,
        Color::Black => Rank::R6,
    }
}

/// Rank-index delta of a single forward pawn step
///
/// Ranks are indexed top-down, so White moves toward smaller indices.
pub const fn pawn_forward_delta(c: Color) -> isize {
    match c {
        Color::White => -1,
        Color::Black => 1,
    }
}
