//! PGN movetext parsing
//!
//! A single-pass, single-character-lookahead parser. Tag pairs are read
//! first (an `FEN` tag seeds the starting position), then the movetext is
//! tokenized with explicit modes for line comments, brace comments and
//! nested variations; each move token is resolved through the algebraic
//! decoder against the running position and applied, so the output move
//! list is the final position's history.
//!
//! Parsing is all-or-nothing: any failure aborts with a line:column
//! locator and the offending text, and no move list is produced.

use crate::board::{FenParseError, Position};
use crate::moves::san::AlgebraicParseError;
use crate::moves::Move;

use std::collections::BTreeMap;

use thiserror::Error;

/// What went wrong while parsing PGN text
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum PgnErrorKind {
    /// Malformed `[Tag "Value"]` pair
    #[error("malformed tag pair")]
    BadTagPair,
    /// The `FEN` tag does not hold a parseable position
    #[error("bad FEN tag: {0}")]
    BadFenTag(#[from] FenParseError),
    /// Move-number token with non-digit characters
    #[error("malformed move number")]
    BadMoveNumber,
    /// A move token failed to resolve against the current position
    #[error("cannot parse move: {0}")]
    BadMove(#[from] AlgebraicParseError),
    /// `)` without an open variation
    #[error("unmatched ')'")]
    UnmatchedCloseParen,
    /// `}` without an open comment
    #[error("unmatched '}}'")]
    UnmatchedCloseBrace,
    /// End of input inside a `{...}` comment
    #[error("unterminated comment")]
    UnterminatedComment,
    /// End of input inside a `(...)` variation
    #[error("unterminated variation")]
    UnterminatedVariation,
}

/// Error parsing PGN text
///
/// Always carries the 1-based line and column where parsing stopped and
/// the raw text span that triggered the failure.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("{kind} at line {line}, column {col} (near {context:?})")]
pub struct PgnParseError {
    pub line: usize,
    pub col: usize,
    pub context: String,
    pub kind: PgnErrorKind,
}

/// A parsed PGN game: its tag pairs and the position after the last move
///
/// # Example
///
/// ```
/// use gambit::PgnGame;
///
/// let game = PgnGame::parse("1. e4 e5 2. Nf3 Nc6").unwrap();
/// assert_eq!(game.moves().len(), 4);
/// assert_eq!(game.moves()[2].algebraic(), "Nf3");
/// ```
#[derive(Debug, Clone)]
pub struct PgnGame {
    tags: BTreeMap<String, String>,
    position: Position,
}

impl PgnGame {
    /// Parses a PGN game: leading tag pairs, then movetext
    ///
    /// Variations are skipped (not applied to the board), `{...}` comments
    /// attach to the move they follow, and a game-termination marker
    /// (`1-0`, `0-1`, `1/2-1/2`, `*`) ends the movetext.
    pub fn parse(text: &str) -> Result<PgnGame, PgnParseError> {
        let mut cursor = Cursor::new(text);
        let mut tags = BTreeMap::new();
        let mut position = None;

        loop {
            cursor.skip_whitespace();
            if cursor.peek() != Some(b'[') {
                break;
            }
            let (line, col) = (cursor.line, cursor.col);
            let (name, value) = cursor.read_tag_pair()?;
            if name == "FEN" {
                position = Some(Position::from_fen(&value).map_err(|e| PgnParseError {
                    line,
                    col,
                    context: value.clone(),
                    kind: PgnErrorKind::BadFenTag(e),
                })?);
            }
            tags.insert(name, value);
        }
        let mut position = position.unwrap_or_else(Position::initial);

        loop {
            cursor.skip_whitespace();
            let c = match cursor.peek() {
                Some(c) => c,
                None => break,
            };
            match c {
                b'.' => cursor.bump(),
                b';' => cursor.skip_line_comment(),
                b'{' => {
                    let text = cursor.read_brace_comment()?;
                    if !text.is_empty() {
                        position.attach_comment_to_last(&text);
                    }
                }
                b'}' => return Err(cursor.error_here(PgnErrorKind::UnmatchedCloseBrace)),
                b'(' => cursor.skip_variation()?,
                b')' => return Err(cursor.error_here(PgnErrorKind::UnmatchedCloseParen)),
                _ => {
                    let (token, line, col) = cursor.read_token();
                    if is_termination_marker(token) {
                        break;
                    }
                    if token.as_bytes()[0].is_ascii_digit() && !token.starts_with("0-0") {
                        if !token.bytes().all(|b| b.is_ascii_digit()) {
                            return Err(PgnParseError {
                                line,
                                col,
                                context: token.to_string(),
                                kind: PgnErrorKind::BadMoveNumber,
                            });
                        }
                        // move numbers are not validated against the clock
                        continue;
                    }
                    let mv = Move::from_algebraic(&position, token).map_err(|e| {
                        PgnParseError {
                            line,
                            col,
                            context: token.to_string(),
                            kind: PgnErrorKind::BadMove(e),
                        }
                    })?;
                    position = position.apply_move(&mv);
                }
            }
        }

        Ok(PgnGame { tags, position })
    }

    /// Returns the tag-pair map
    #[inline]
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Returns the value of tag `name`, if present
    #[inline]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Returns the parsed moves in order
    #[inline]
    pub fn moves(&self) -> &[Move] {
        self.position.history()
    }

    /// Returns the position after the last move
    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Consumes the game, returning the final position
    #[inline]
    pub fn into_position(self) -> Position {
        self.position
    }
}

/// Parses PGN text and returns the move list alone
///
/// Convenience over [`PgnGame::parse`] for callers that do not need the
/// tags or the final position.
pub fn parse_pgn_moves(text: &str) -> Result<Vec<Move>, PgnParseError> {
    Ok(PgnGame::parse(text)?.position.history.clone())
}

fn is_termination_marker(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

fn is_token_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'.' | b'{' | b'}' | b'(' | b')' | b';')
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Cursor<'a> {
        Cursor {
            src,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) {
        if let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn skip_line_comment(&mut self) {
        while !matches!(self.peek(), None | Some(b'\n')) {
            self.bump();
        }
    }

    fn error_here(&self, kind: PgnErrorKind) -> PgnParseError {
        self.error_at(self.line, self.col, kind)
    }

    fn error_at(&self, line: usize, col: usize, kind: PgnErrorKind) -> PgnParseError {
        let rest = &self.src[self.pos.min(self.src.len())..];
        let context: String = rest.chars().take(16).collect();
        PgnParseError {
            line,
            col,
            context,
            kind,
        }
    }

    /// Reads one `[Name "Value"]` pair, cursor on `[`
    fn read_tag_pair(&mut self) -> Result<(String, String), PgnParseError> {
        let (line, col) = (self.line, self.col);
        let fail = |s: &Self| s.error_at(line, col, PgnErrorKind::BadTagPair);

        self.bump(); // '['
        self.skip_whitespace();
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.bump();
        }
        let name = self.src[start..self.pos].to_string();
        if name.is_empty() {
            return Err(fail(self));
        }
        self.skip_whitespace();
        if self.peek() != Some(b'"') {
            return Err(fail(self));
        }
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(fail(self)),
                Some(b'"') => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    match self.peek() {
                        Some(c @ (b'"' | b'\\')) => {
                            value.push(c as char);
                            self.bump();
                        }
                        _ => return Err(fail(self)),
                    }
                }
                Some(c) => {
                    value.push(c as char);
                    self.bump();
                }
            }
        }
        self.skip_whitespace();
        if self.peek() != Some(b']') {
            return Err(fail(self));
        }
        self.bump();
        Ok((name, value))
    }

    /// Reads a `{...}` comment, cursor on `{`; returns the trimmed body
    fn read_brace_comment(&mut self) -> Result<String, PgnParseError> {
        let (line, col) = (self.line, self.col);
        self.bump(); // '{'
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error_at(line, col, PgnErrorKind::UnterminatedComment)),
                Some(b'}') => {
                    let body = self.src[start..self.pos].trim().to_string();
                    self.bump();
                    return Ok(body);
                }
                _ => self.bump(),
            }
        }
    }

    /// Skips a `(...)` variation, cursor on `(`; nested variations and
    /// comments inside are consumed without touching the board
    fn skip_variation(&mut self) -> Result<(), PgnParseError> {
        let (line, col) = (self.line, self.col);
        self.bump(); // '('
        let mut depth = 1_usize;
        while depth > 0 {
            match self.peek() {
                None => {
                    return Err(self.error_at(line, col, PgnErrorKind::UnterminatedVariation))
                }
                Some(b'(') => {
                    depth += 1;
                    self.bump();
                }
                Some(b')') => {
                    depth -= 1;
                    self.bump();
                }
                Some(b'{') => {
                    let _ = self.read_brace_comment()?;
                }
                Some(b';') => self.skip_line_comment(),
                _ => self.bump(),
            }
        }
        Ok(())
    }

    /// Reads a run of non-delimiter characters, returning it with the
    /// line/column it started at
    fn read_token(&mut self) -> (&'a str, usize, usize) {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        while matches!(self.peek(), Some(b) if !is_token_delimiter(b)) {
            self.bump();
        }
        (&self.src[start..self.pos], line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, PieceKind, Square};
    use std::str::FromStr;

    #[test]
    fn test_short_fragment() {
        let game = PgnGame::parse("1. e4 e5 2. Nf3 Nc6").unwrap();
        assert_eq!(game.moves().len(), 4);
        let fen = game.position().as_fen();
        assert_eq!(
            fen.split(' ').next().unwrap(),
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R"
        );
    }

    #[test]
    fn test_tags_are_collected() {
        let game = PgnGame::parse(
            r#"[Event "Casual Game"]
[Site "?"]
[White "Someone"]

1. e4 e5 *"#,
        )
        .unwrap();
        assert_eq!(game.tag("Event"), Some("Casual Game"));
        assert_eq!(game.tag("White"), Some("Someone"));
        assert_eq!(game.tag("Black"), None);
        assert_eq!(game.moves().len(), 2);
    }

    #[test]
    fn test_fen_tag_seeds_the_position() {
        let game = PgnGame::parse(
            r#"[FEN "4k3/8/8/8/8/8/8/4K2R w K - 0 1"]

1. O-O Kd7"#,
        )
        .unwrap();
        assert_eq!(game.moves().len(), 2);
        assert_eq!(game.moves()[0].algebraic(), "O-O");
        assert_eq!(
            game.position().get(Square::from_str("g1").unwrap()),
            Some(crate::types::Piece::white(PieceKind::King))
        );
    }

    #[test]
    fn test_comments_attach_to_moves() {
        let game =
            PgnGame::parse("1. e4 {best by test} e5 {classical} 2. Nf3").unwrap();
        assert_eq!(game.moves()[0].comment(), Some("best by test"));
        assert_eq!(game.moves()[1].comment(), Some("classical"));
        assert_eq!(game.moves()[2].comment(), None);
    }

    #[test]
    fn test_multi_line_comment() {
        let game = PgnGame::parse("1. e4 {spans\ntwo lines} e5").unwrap();
        assert_eq!(game.moves()[0].comment(), Some("spans\ntwo lines"));
        assert_eq!(game.moves().len(), 2);
    }

    #[test]
    fn test_line_comments_are_skipped() {
        let game = PgnGame::parse("1. e4 ; king's pawn\n1... e5 2. Nf3").unwrap();
        assert_eq!(game.moves().len(), 3);
    }

    #[test]
    fn test_variations_are_skipped() {
        let game =
            PgnGame::parse("1. e4 e5 (1... c5 2. Nf3 (2. c3 d5) d6) 2. Nf3 Nc6").unwrap();
        assert_eq!(game.moves().len(), 4);
        assert_eq!(game.moves()[1].algebraic(), "e5");
        // a comment with a stray ')' inside a variation must not close it
        let game = PgnGame::parse("1. e4 (1... c5 {wrong ) side}) e5").unwrap();
        assert_eq!(game.moves().len(), 2);
    }

    #[test]
    fn test_termination_markers() {
        for marker in ["1-0", "0-1", "1/2-1/2", "*"] {
            let game = PgnGame::parse(&format!("1. e4 e5 {}", marker)).unwrap();
            assert_eq!(game.moves().len(), 2, "marker {}", marker);
        }
    }

    #[test]
    fn test_zero_style_castling_is_not_a_move_number() {
        let game = PgnGame::parse(
            r#"[FEN "4k3/8/8/8/8/8/8/4K2R w K - 0 1"]

1. 0-0"#,
        )
        .unwrap();
        assert_eq!(game.moves().len(), 1);
        assert_eq!(game.moves()[0].algebraic(), "O-O");
    }

    #[test]
    fn test_unmatched_close_paren() {
        let err = PgnGame::parse("1. e4 e5) 2. Nf3").unwrap_err();
        assert_eq!(err.kind, PgnErrorKind::UnmatchedCloseParen);
        assert_eq!(err.line, 1);
        assert_eq!(err.col, 9);
    }

    #[test]
    fn test_unmatched_close_brace() {
        let err = PgnGame::parse("1. e4 } e5").unwrap_err();
        assert_eq!(err.kind, PgnErrorKind::UnmatchedCloseBrace);
        assert_eq!(err.col, 7);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = PgnGame::parse("1. e4 {forever").unwrap_err();
        assert_eq!(err.kind, PgnErrorKind::UnterminatedComment);
        assert_eq!(err.col, 7);
    }

    #[test]
    fn test_unterminated_variation() {
        let err = PgnGame::parse("1. e4 (1... c5 2. Nf3").unwrap_err();
        assert_eq!(err.kind, PgnErrorKind::UnterminatedVariation);
        assert_eq!(err.col, 7);
    }

    #[test]
    fn test_bad_move_number() {
        let err = PgnGame::parse("1. e4 e5 2x. Nf3").unwrap_err();
        assert_eq!(err.kind, PgnErrorKind::BadMoveNumber);
        assert_eq!(err.context, "2x");
        assert_eq!(err.col, 10);
    }

    #[test]
    fn test_bad_move_reports_location() {
        let err = PgnGame::parse("1. e4 e5\n2. Nf9 Nc6").unwrap_err();
        assert!(matches!(err.kind, PgnErrorKind::BadMove(_)));
        assert_eq!(err.line, 2);
        assert_eq!(err.col, 4);
        assert_eq!(err.context, "Nf9");
    }

    #[test]
    fn test_illegal_move_fails() {
        let err = PgnGame::parse("1. e4 e5 2. Ke2 Ke7 3. O-O").unwrap_err();
        assert!(matches!(err.kind, PgnErrorKind::BadMove(_)));
        assert_eq!(err.line, 1);
        assert_eq!(err.context, "O-O");
    }

    #[test]
    fn test_bad_fen_tag() {
        let err = PgnGame::parse("[FEN \"not a fen\"]\n\n1. e4\n").unwrap_err();
        assert!(matches!(err.kind, PgnErrorKind::BadFenTag(_)));
        assert_eq!(err.line, 1);
        assert_eq!(err.context, "not a fen");
    }

    #[test]
    fn test_bad_tag_pair() {
        let err = PgnGame::parse("[Event Casual]\n1. e4").unwrap_err();
        assert_eq!(err.kind, PgnErrorKind::BadTagPair);
        assert_eq!(err.line, 1);
        assert_eq!(err.col, 1);
    }

    #[test]
    fn test_empty_input_is_an_empty_game() {
        let game = PgnGame::parse("").unwrap();
        assert!(game.moves().is_empty());
        assert_eq!(game.position().side(), Color::White);

        let game = PgnGame::parse("   \n\n").unwrap();
        assert!(game.moves().is_empty());
    }

    #[test]
    fn test_missing_black_move_at_end_is_fine() {
        let game = PgnGame::parse("1. e4 e5 2. Nf3").unwrap();
        assert_eq!(game.moves().len(), 3);
    }

    #[test]
    fn test_parse_pgn_moves_helper() {
        let moves = parse_pgn_moves("1. d4 d5 2. c4 e6").unwrap();
        assert_eq!(moves.len(), 4);
        assert_eq!(moves[3].algebraic(), "e6");
        assert_eq!(moves[3].color(), Color::Black);
    }
}
