//! Position and FEN conversion

use crate::legal::{self, SquareList};
use crate::moves::Move;
use crate::types::{
    self, CastlingRights, Color, File, Piece, PieceKind, Rank, Square,
};
use crate::geometry;

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

/// FEN for the canonical starting position
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Error parsing the placement part of FEN (i.e. the positions of pieces on
/// the board)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum PlacementParseError {
    /// Rank sums to more than 8 files
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank sums to fewer than 8 files
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Error parsing a [`Position`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FenParseError {
    /// FEN contains non-ASCII characters
    #[error("non-ASCII data in FEN")]
    NonAscii,
    /// Error parsing the placement field
    #[error("bad placement: {0}")]
    Placement(#[from] PlacementParseError),
    /// Error parsing the side-to-move field
    #[error("bad move side: {0}")]
    MoveSide(#[from] types::ColorParseError),
    /// Error parsing the castling-rights field
    #[error("bad castling rights: {0}")]
    Castling(#[from] types::CastlingRightsParseError),
    /// Error parsing the en-passant field
    #[error("bad en passant: {0}")]
    Enpassant(#[from] types::SquareParseError),
    /// En-passant target is on a rank that cannot follow a double pawn move
    #[error("invalid en passant rank {0}")]
    InvalidEnpassantRank(Rank),
    /// Error parsing the half-move clock
    #[error("bad half-move clock: {0}")]
    MoveCounter(ParseIntError),
    /// Error parsing the full-move number
    #[error("bad move number: {0}")]
    MoveNumber(ParseIntError),
    /// Full-move number is zero
    #[error("move number must be at least 1")]
    ZeroMoveNumber,
    /// FEN contains extra data
    #[error("extra data in FEN")]
    ExtraData,
}

/// A chess position
///
/// `Position` carries the full state of a game in progress: the piece
/// layout, side to move, castling rights, en-passant target, the two FEN
/// clocks, the ordered history of moves that produced it, and a fully
/// computed table of legal destination squares for the side to move.
///
/// A `Position` is a value: it is never modified once the legal-move table
/// is filled. Applying a move via [`Position::apply_move`] produces a *new*
/// `Position` whose table is already computed, so callers never observe a
/// stale or partial table.
///
/// # Example
///
/// ```
/// use gambit::{Move, Position};
///
/// let pos = Position::initial();
/// let mv = Move::from_algebraic(&pos, "e4").unwrap();
/// let pos = pos.apply_move(&mv);
/// assert_eq!(
///     pos.as_fen(),
///     "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Position {
    pub(crate) cells: BTreeMap<Square, Piece>,
    pub(crate) side: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) ep_target: Option<Square>,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
    pub(crate) history: Vec<Move>,
    pub(crate) allowed: BTreeMap<Square, SquareList>,
}

impl Position {
    /// Returns the canonical starting position
    pub fn initial() -> Position {
        let mut cells = BTreeMap::new();
        for file in File::iter() {
            cells.insert(
                Square::from_parts(file, Rank::R2),
                Piece::white(PieceKind::Pawn),
            );
            cells.insert(
                Square::from_parts(file, Rank::R7),
                Piece::black(PieceKind::Pawn),
            );
        }
        for (color, rank) in [(Color::White, Rank::R1), (Color::Black, Rank::R8)] {
            for (file, kind) in [
                (File::A, PieceKind::Rook),
                (File::B, PieceKind::Knight),
                (File::C, PieceKind::Bishop),
                (File::D, PieceKind::Queen),
                (File::E, PieceKind::King),
                (File::F, PieceKind::Bishop),
                (File::G, PieceKind::Knight),
                (File::H, PieceKind::Rook),
            ] {
                cells.insert(Square::from_parts(file, rank), Piece::new(color, kind));
            }
        }
        let mut res = Position {
            cells,
            side: Color::White,
            castling: CastlingRights::FULL,
            ep_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
            allowed: BTreeMap::new(),
        };
        legal::fill_allowed_moves(&mut res);
        res
    }

    /// Parses a position from FEN
    ///
    /// Does the same as [`Position::from_str`]. It is recommended to use
    /// this function instead of `from_str()` for better readability.
    #[inline]
    pub fn from_fen(fen: &str) -> Result<Position, FenParseError> {
        Position::from_str(fen)
    }

    /// Returns the piece on square `sq`, if any
    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells.get(&sq).copied()
    }

    /// Returns the piece on the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Option<Piece> {
        self.get(Square::from_parts(file, rank))
    }

    /// Returns side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.side
    }

    /// Returns the castling rights
    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    /// Returns the en-passant target square
    ///
    /// `Some` only in the position immediately following a double pawn
    /// move, holding the square the pawn passed over.
    #[inline]
    pub fn ep_target(&self) -> Option<Square> {
        self.ep_target
    }

    /// Returns the number of plies since the last pawn move or capture
    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    /// Returns the full-move number, incremented after each move by Black
    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Returns the moves that produced this position, oldest first
    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Returns the legal destination squares per origin square
    ///
    /// Only origins with at least one legal destination are present, and
    /// only pieces of the side to move ever appear. An empty table means
    /// the side to move has no legal moves at all; this crate does not
    /// classify that as checkmate or stalemate.
    #[inline]
    pub fn allowed_moves(&self) -> &BTreeMap<Square, SquareList> {
        &self.allowed
    }

    /// Returns the legal destination squares for the piece at `from`
    ///
    /// An empty slice is returned both for empty squares and for pieces
    /// with no legal moves.
    #[inline]
    pub fn allowed_from(&self, from: Square) -> &[Square] {
        self.allowed.get(&from).map_or(&[], |list| list.as_slice())
    }

    /// Returns the position of the king of color `c`, if it is on the board
    pub fn king_square(&self, c: Color) -> Option<Square> {
        self.cells
            .iter()
            .find(|(_, p)| **p == Piece::new(c, PieceKind::King))
            .map(|(sq, _)| *sq)
    }

    /// Returns `true` if the side to move is currently in check
    pub fn is_check(&self) -> bool {
        match self.king_square(self.side) {
            Some(king) => legal::is_square_attacked(self, king, self.side.inv()),
            None => false,
        }
    }

    /// Attaches a free-text comment to the most recent move, if any
    pub(crate) fn attach_comment_to_last(&mut self, text: &str) {
        if let Some(mv) = self.history.last_mut() {
            mv.append_comment(text);
        }
    }

    /// Wraps the position to allow pretty-printing with the given style
    ///
    /// The resulting wrapper implements [`fmt::Display`], so can be used
    /// with `write!()`, `println!()`, or `ToString::to_string`.
    ///
    /// # Example
    ///
    /// ```
    /// # use gambit::{Position, board::PrettyStyle};
    /// #
    /// let p = Position::initial();
    ///
    /// let res = r#"
    /// 8|rnbqkbnr
    /// 7|pppppppp
    /// 6|........
    /// 5|........
    /// 4|........
    /// 3|........
    /// 2|PPPPPPPP
    /// 1|RNBQKBNR
    /// -+--------
    /// W|abcdefgh
    /// "#;
    /// assert_eq!(p.pretty(PrettyStyle::Ascii).to_string().trim(), res.trim());
    /// ```
    #[inline]
    pub fn pretty(&self, style: PrettyStyle) -> Pretty<'_> {
        Pretty { pos: self, style }
    }

    /// Converts the position into a FEN string
    ///
    /// Does the same as `Position::to_string()`. It is recommended to use
    /// this function instead of `to_string()` for better readability.
    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Position {
    /// Positions are equal when their FEN-visible components are equal;
    /// move history and the derived legal-move table do not take part
    fn eq(&self, other: &Position) -> bool {
        self.cells == other.cells
            && self.side == other.side
            && self.castling == other.castling
            && self.ep_target == other.ep_target
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
    }
}

impl Eq for Position {}

fn parse_placement(s: &str) -> Result<BTreeMap<Square, Piece>, PlacementParseError> {
    type Error = PlacementParseError;

    let mut file = 0_usize;
    let mut rank = 0_usize;
    let mut cells = BTreeMap::new();
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                file += add;
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(Rank::from_index(rank)));
                }
                rank += 1;
                file = 0;
                if rank >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                if file >= 8 {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                let piece =
                    Piece::from_char(b as char).ok_or(Error::UnexpectedChar(b as char))?;
                cells.insert(
                    Square::from_parts(File::from_index(file), Rank::from_index(rank)),
                    piece,
                );
                file += 1;
            }
        };
    }

    if file < 8 {
        return Err(Error::RankUnderflow(Rank::from_index(rank)));
    }
    if rank < 7 {
        return Err(Error::Underflow);
    }

    Ok(cells)
}

fn parse_ep_target(s: &str, side: Color) -> Result<Option<Square>, FenParseError> {
    if s == "-" {
        return Ok(None);
    }
    let target = Square::from_str(s)?;
    if target.rank() != geometry::enpassant_target_rank(side.inv()) {
        return Err(FenParseError::InvalidEnpassantRank(target.rank()));
    }
    Ok(Some(target))
}

impl FromStr for Position {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Position, Self::Err> {
        type Error = FenParseError;

        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }
        let mut iter = s.split(' ').fuse();

        // Trailing fields may be omitted and take their defaults.
        let cells = parse_placement(iter.next().unwrap_or(""))?;
        let side = match iter.next() {
            Some(f) => Color::from_str(f)?,
            None => Color::White,
        };
        let castling = match iter.next() {
            Some(f) => CastlingRights::from_str(f)?,
            None => CastlingRights::EMPTY,
        };
        let ep_target = match iter.next() {
            Some(f) => parse_ep_target(f, side)?,
            None => None,
        };
        let halfmove_clock = match iter.next() {
            Some(f) => u16::from_str(f).map_err(Error::MoveCounter)?,
            None => 0,
        };
        let fullmove_number = match iter.next() {
            Some(f) => u16::from_str(f).map_err(Error::MoveNumber)?,
            None => 1,
        };
        if fullmove_number == 0 {
            return Err(Error::ZeroMoveNumber);
        }

        if iter.next().is_some() {
            return Err(Error::ExtraData);
        }

        let mut res = Position {
            cells,
            side,
            castling,
            ep_target,
            halfmove_clock,
            fullmove_number,
            history: Vec::new(),
            allowed: BTreeMap::new(),
        };
        legal::fill_allowed_moves(&mut res);
        Ok(res)
    }
}

fn format_placement(
    cells: &BTreeMap<Square, Piece>,
    f: &mut fmt::Formatter<'_>,
) -> Result<(), fmt::Error> {
    for rank in Rank::iter() {
        if rank.index() != 0 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for file in File::iter() {
            match cells.get(&Square::from_parts(file, rank)) {
                None => empty += 1,
                Some(piece) => {
                    if empty != 0 {
                        write!(f, "{}", (b'0' + empty) as char)?;
                        empty = 0;
                    }
                    write!(f, "{}", piece)?;
                }
            }
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_placement(&self.cells, f)?;
        write!(f, " {} {}", self.side, self.castling)?;
        match self.ep_target {
            Some(sq) => write!(f, " {}", sq)?,
            None => write!(f, " -")?,
        };
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)?;
        Ok(())
    }
}

/// Style for [`Position::pretty()`]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrettyStyle {
    /// Print pieces and frames as ASCII characters
    Ascii,
    /// Print pieces and frames as fancy Unicode characters
    Utf8,
}

/// Wrapper to pretty-print the position
///
/// See docs for [`Position::pretty()`] for more details.
pub struct Pretty<'a> {
    pos: &'a Position,
    style: PrettyStyle,
}

trait StyleTable {
    const HORZ_FRAME: char;
    const VERT_FRAME: char;
    const ANGLE_FRAME: char;
    const WHITE_INDICATOR: char;
    const BLACK_INDICATOR: char;
    const EMPTY: char = '.';

    fn piece(p: Piece) -> char;

    fn indicator(c: Color) -> char {
        match c {
            Color::White => Self::WHITE_INDICATOR,
            Color::Black => Self::BLACK_INDICATOR,
        }
    }

    fn fmt(pos: &Position, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for rank in Rank::iter() {
            write!(f, "{}{}", rank, Self::VERT_FRAME)?;
            for file in File::iter() {
                match pos.get2(file, rank) {
                    Some(p) => write!(f, "{}", Self::piece(p))?,
                    None => write!(f, "{}", Self::EMPTY)?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "{}{}", Self::HORZ_FRAME, Self::ANGLE_FRAME)?;
        for _ in File::iter() {
            write!(f, "{}", Self::HORZ_FRAME)?;
        }
        writeln!(f)?;
        write!(f, "{}{}", Self::indicator(pos.side), Self::VERT_FRAME)?;
        for file in File::iter() {
            write!(f, "{}", file)?;
        }
        writeln!(f)?;
        Ok(())
    }
}

struct AsciiStyleTable;
struct Utf8StyleTable;

impl StyleTable for AsciiStyleTable {
    const HORZ_FRAME: char = '-';
    const VERT_FRAME: char = '|';
    const ANGLE_FRAME: char = '+';
    const WHITE_INDICATOR: char = 'W';
    const BLACK_INDICATOR: char = 'B';

    fn piece(p: Piece) -> char {
        p.as_char()
    }
}

impl StyleTable for Utf8StyleTable {
    const HORZ_FRAME: char = '─';
    const VERT_FRAME: char = '│';
    const ANGLE_FRAME: char = '┼';
    const WHITE_INDICATOR: char = '○';
    const BLACK_INDICATOR: char = '●';

    fn piece(p: Piece) -> char {
        p.as_utf8_char()
    }
}

impl<'a> Display for Pretty<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.style {
            PrettyStyle::Ascii => AsciiStyleTable::fmt(self.pos, f),
            PrettyStyle::Utf8 => Utf8StyleTable::fmt(self.pos, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial() {
        assert_eq!(Position::initial().to_string(), INITIAL_FEN);
        assert_eq!(Position::from_str(INITIAL_FEN), Ok(Position::initial()));
    }

    #[test]
    fn test_midgame() {
        const FEN: &str = "1rq1r1k1/1p3ppp/pB3n2/3ppP2/Pbb1P3/1PN2B2/2P2QPP/R1R4K w - - 1 21";

        let pos = Position::from_fen(FEN).unwrap();
        assert_eq!(pos.as_fen(), FEN);
        assert_eq!(
            pos.get2(File::B, Rank::R4),
            Some(Piece::black(PieceKind::Bishop))
        );
        assert_eq!(
            pos.get2(File::F, Rank::R2),
            Some(Piece::white(PieceKind::Queen))
        );
        assert_eq!(pos.get2(File::E, Rank::R1), None);
        assert_eq!(
            pos.king_square(Color::White),
            Some(Square::from_parts(File::H, Rank::R1))
        );
        assert_eq!(
            pos.king_square(Color::Black),
            Some(Square::from_parts(File::G, Rank::R8))
        );
        assert_eq!(pos.side(), Color::White);
        assert_eq!(pos.castling(), CastlingRights::EMPTY);
        assert_eq!(pos.ep_target(), None);
        assert_eq!(pos.halfmove_clock(), 1);
        assert_eq!(pos.fullmove_number(), 21);
    }

    #[test]
    fn test_ep_round_trip() {
        const FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let pos = Position::from_fen(FEN).unwrap();
        assert_eq!(
            pos.ep_target(),
            Some(Square::from_parts(File::E, Rank::R3))
        );
        assert_eq!(pos.as_fen(), FEN);
    }

    #[test]
    fn test_missing_fields_default() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").unwrap();
        assert_eq!(pos.side(), Color::White);
        assert_eq!(pos.castling(), CastlingRights::EMPTY);
        assert_eq!(pos.ep_target(), None);
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);

        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 10").unwrap();
        assert_eq!(pos.halfmove_clock(), 10);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_bad_fens() {
        assert_eq!(
            Position::from_fen("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenParseError::Placement(PlacementParseError::RankUnderflow(
                Rank::R7
            )))
        );
        assert_eq!(
            Position::from_fen("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenParseError::Placement(PlacementParseError::RankOverflow(
                Rank::R7
            )))
        );
        assert_eq!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1"),
            Err(FenParseError::Placement(PlacementParseError::Underflow))
        );
        assert_eq!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenParseError::Placement(PlacementParseError::Overflow))
        );
        assert_eq!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNT w KQkq - 0 1"),
            Err(FenParseError::Placement(PlacementParseError::UnexpectedChar('T')))
        );
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenParseError::MoveSide(_))
        ));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1"),
            Err(FenParseError::Castling(_))
        ));
        assert_eq!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1"),
            Err(FenParseError::InvalidEnpassantRank(Rank::R4))
        );
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1"),
            Err(FenParseError::MoveCounter(_))
        ));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - -1 1"),
            Err(FenParseError::MoveCounter(_))
        ));
        assert_eq!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0"),
            Err(FenParseError::ZeroMoveNumber)
        );
        assert_eq!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 z"),
            Err(FenParseError::ExtraData)
        );
    }

    #[test]
    fn test_equality_ignores_history() {
        let a = Position::initial();
        let b = Position::from_fen(INITIAL_FEN).unwrap();
        assert_eq!(a, b);

        let other =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1").unwrap();
        assert_ne!(a, other);
    }
}
