//! The lexer.
//!
//! A stateful byte cursor, not a tokenizer: it never materializes a token
//! list or even a single discrete token. The parser drives it with typed
//! probes (`match_str`, `matchx`, `match_id`, `parse_number`, ...) and each
//! probe either consumes input and returns the recognized fragment, or
//! leaves the cursor untouched and returns a failure the parser can react
//! to by trying the next alternative — there is no general putback, only
//! "don't advance on failure".

use simple_base::Span;

use crate::error::ParseErrorKind;

fn is_id_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_id_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src: src.as_bytes(), pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn skip_whitespace(&mut self) {
        while self.src.get(self.pos).is_some_and(|&b| b <= 0x20) {
            self.pos += 1;
        }
    }

    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.src.get(pos).copied()
    }

    /// The next raw byte after skipping whitespace, without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.byte_at(self.pos)
    }

    pub fn is_eof(&mut self) -> bool {
        self.peek().is_none()
    }

    /// If the next non-whitespace bytes equal `s`, consumes them and
    /// returns `true`; otherwise leaves the cursor unchanged.
    pub fn match_str(&mut self, s: &str) -> bool {
        self.skip_whitespace();
        if self.src[self.pos..].starts_with(s.as_bytes()) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Like [`Lexer::match_str`], but additionally requires that the byte
    /// right after `s` not continue an identifier — so `matchx("if")`
    /// doesn't swallow the `if` prefix of `ifrit`.
    pub fn matchx(&mut self, s: &str) -> bool {
        self.skip_whitespace();
        let start = self.pos;
        if !self.match_str(s) {
            return false;
        }
        if self.byte_at(self.pos).is_some_and(is_id_cont) {
            self.pos = start;
            return false;
        }
        true
    }

    pub fn peek_is_id(&mut self) -> bool {
        self.skip_whitespace();
        self.byte_at(self.pos).is_some_and(is_id_start)
    }

    /// If the next non-whitespace byte starts an identifier, consumes the
    /// maximal identifier run and returns its text and span; otherwise
    /// leaves the cursor unchanged.
    pub fn match_id(&mut self) -> Option<(&'a str, Span)> {
        self.skip_whitespace();
        if !self.peek_is_id() {
            return None;
        }
        let start = self.pos;
        while self.byte_at(self.pos).is_some_and(is_id_cont) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .expect("identifiers are ascii, which is always valid utf-8");
        Some((text, Span::new(start, self.pos)))
    }

    pub fn is_number(&mut self) -> bool {
        self.skip_whitespace();
        self.byte_at(self.pos).is_some_and(|b| b.is_ascii_digit())
    }

    /// Scans a decimal integer literal. Rejects a leading zero followed by
    /// more digits (`007`); `0` alone is fine.
    pub fn parse_number(&mut self) -> Result<(i64, Span), ParseErrorKind> {
        self.skip_whitespace();
        let start = self.pos;
        while self.byte_at(self.pos).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).expect("scanned only ascii digits");
        if text.len() > 1 && text.starts_with('0') {
            return Err(ParseErrorKind::LeadingZero);
        }
        let value: i64 = text.parse().expect("scanned only ascii digits, within i64 range");
        Ok((value, Span::new(start, self.pos)))
    }

    pub fn span_here(&mut self) -> Span {
        self.skip_whitespace();
        Span::new(self.pos, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_str_skips_leading_whitespace() {
        let mut lex = Lexer::new("   ;");
        assert!(lex.match_str(";"));
    }

    #[test]
    fn match_str_does_not_advance_on_failure() {
        let mut lex = Lexer::new("while");
        let before = lex.pos();
        assert!(!lex.match_str("if"));
        assert_eq!(lex.pos(), before);
    }

    #[test]
    fn matchx_rejects_keyword_prefix_of_longer_identifier() {
        let mut lex = Lexer::new("ifrit");
        assert!(!lex.matchx("if"));
        let (id, _) = lex.match_id().unwrap();
        assert_eq!(id, "ifrit");
    }

    #[test]
    fn matchx_accepts_keyword_followed_by_boundary() {
        let mut lex = Lexer::new("if(x)");
        assert!(lex.matchx("if"));
        assert!(lex.match_str("("));
    }

    #[test]
    fn parse_number_rejects_leading_zero() {
        let mut lex = Lexer::new("007");
        assert_eq!(lex.parse_number(), Err(ParseErrorKind::LeadingZero));
    }

    #[test]
    fn parse_number_accepts_bare_zero() {
        let mut lex = Lexer::new("0;");
        let (value, _) = lex.parse_number().unwrap();
        assert_eq!(value, 0);
    }

    #[test]
    fn longer_operator_is_tried_before_its_prefix() {
        let mut lex = Lexer::new("<=");
        assert!(lex.match_str("<="));
        assert!(lex.is_eof());
    }

    #[test]
    fn match_id_stops_at_non_continuation_byte() {
        let mut lex = Lexer::new("foo_bar1 + 2");
        let (id, span) = lex.match_id().unwrap();
        assert_eq!(id, "foo_bar1");
        assert_eq!(span.len(), 8);
    }
}
