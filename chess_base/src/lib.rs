//! Base types for the `gambit` chess crates
//!
//! This crate contains only value types and board geometry facts; all the
//! rules logic lives in the `gambit` crate, which also re-exports
//! everything here. Do not depend on this crate directly.

pub mod geometry;
pub mod types;

pub use types::{
    CastlingRights, CastlingSide, Color, File, Piece, PieceKind, Rank, Square,
};
