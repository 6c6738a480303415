//! Lexical scanner.
//!
//! The scanner is a state machine: the current [`Mode`] and the class of the
//! next character select an action, and actions switch modes. Layer and
//! range selectors as well as quoted literals are scanned in their own
//! modes so that their contents are never confused with default-mode tokens.

mod literal;
mod token;

pub use self::token::{LiteralShape, Token, TokenKind};

use crate::{
    diagnostics::{Diagnostics, Warning},
    lex::{count_while, Lex, LexError, LexErrorKind},
    location::{Location, Span},
    op::{ArithOp, LogicalOp, Punct, TestOp, UnaryOp, DEPRECATED_ANY_NE},
    rhs_types::string::{lex_char_constant, lex_escape},
};
use std::mem;

/// Scanner mode.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// Operators, punctuation, words and address literals.
    Default,
    /// After `#`: a layer index or `[`.
    Layer,
    /// Inside `[...]`: range fragments.
    Range,
    /// Inside `"..."` or `r"..."`.
    DQuote,
    /// Inside `'...'`.
    SQuote,
    /// Reserved for scanning references in their own mode; `$` is currently
    /// scanned as punctuation in the default mode.
    Reference,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum CharClass {
    Eof,
    Blank,
    DoubleQuote,
    SingleQuote,
    Backslash,
    Hash,
    LeftBracket,
    RightBracket,
    Comma,
    Digit,
    Other,
}

impl CharClass {
    fn of(c: Option<char>) -> Self {
        match c {
            None => CharClass::Eof,
            Some(' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C') => CharClass::Blank,
            Some('"') => CharClass::DoubleQuote,
            Some('\'') => CharClass::SingleQuote,
            Some('\\') => CharClass::Backslash,
            Some('#') => CharClass::Hash,
            Some('[') => CharClass::LeftBracket,
            Some(']') => CharClass::RightBracket,
            Some(',') => CharClass::Comma,
            Some('0'..='9') => CharClass::Digit,
            Some(_) => CharClass::Other,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Action {
    Finish,
    SkipBlank,
    OpenString,
    OpenChar,
    OpenLayer,
    OpenRange,
    Recognize,
    LayerIndex,
    RangeFragment,
    RangeComma,
    CloseRange,
    StringRun,
    StringEscape,
    CloseString,
    CharRun,
    CharEscape,
    CloseChar,
    Fail(Failure),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Failure {
    ExpectedLayerIndex,
    MissingRightBracket,
    MissingFinalQuote,
}

impl From<Failure> for LexErrorKind {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::ExpectedLayerIndex => LexErrorKind::ExpectedLayerIndex,
            Failure::MissingRightBracket => LexErrorKind::MissingRightBracket,
            Failure::MissingFinalQuote => LexErrorKind::MissingFinalQuote,
        }
    }
}

fn dispatch(mode: Mode, class: CharClass) -> Action {
    use self::{Action::*, CharClass::*};

    match (mode, class) {
        (Mode::Default | Mode::Reference, Eof) => Finish,
        (Mode::Default | Mode::Reference, Blank) => SkipBlank,
        (Mode::Default | Mode::Reference, DoubleQuote) => OpenString,
        (Mode::Default | Mode::Reference, SingleQuote) => OpenChar,
        (Mode::Default | Mode::Reference, Hash) => OpenLayer,
        (Mode::Default | Mode::Reference, LeftBracket) => OpenRange,
        (Mode::Default | Mode::Reference, _) => Recognize,

        (Mode::Layer, Digit) => LayerIndex,
        (Mode::Layer, LeftBracket) => OpenRange,
        (Mode::Layer, _) => Fail(Failure::ExpectedLayerIndex),

        (Mode::Range, Eof) => Fail(Failure::MissingRightBracket),
        (Mode::Range, Comma) => RangeComma,
        (Mode::Range, RightBracket) => CloseRange,
        (Mode::Range, _) => RangeFragment,

        (Mode::DQuote | Mode::SQuote, Eof) => Fail(Failure::MissingFinalQuote),
        (Mode::DQuote, DoubleQuote) => CloseString,
        (Mode::DQuote, Backslash) => StringEscape,
        (Mode::DQuote, _) => StringRun,
        (Mode::SQuote, SingleQuote) => CloseChar,
        (Mode::SQuote, Backslash) => CharEscape,
        (Mode::SQuote, _) => CharRun,
    }
}

/// Default-mode rules in priority order. When two rules match the same
/// length, the earlier one wins.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Rule {
    DeprecatedAnyNe,
    Test(TestOp),
    Logical(LogicalOp),
    Unary(UnaryOp),
    Arith(ArithOp),
    Punct(Punct),
    RawString,
    Ether,
    Ipv4,
    Ipv6,
    ColonBytes,
    DashBytes,
    DotBytes,
    HexRun,
    Identifier,
}

fn lexed_len<'i, T: Lex<'i>>(input: &'i str) -> Option<(T, usize)> {
    T::lex(input)
        .ok()
        .map(|(value, rest)| (value, input.len() - rest.len()))
}

fn longest_match(input: &str) -> Option<(Rule, usize)> {
    let operators = [
        input
            .starts_with(DEPRECATED_ANY_NE)
            .then(|| (Rule::DeprecatedAnyNe, DEPRECATED_ANY_NE.len())),
        lexed_len::<TestOp>(input).map(|(op, len)| (Rule::Test(op), len)),
        lexed_len::<LogicalOp>(input).map(|(op, len)| (Rule::Logical(op), len)),
        lexed_len::<UnaryOp>(input).map(|(op, len)| (Rule::Unary(op), len)),
        lexed_len::<ArithOp>(input).map(|(op, len)| (Rule::Arith(op), len)),
        lexed_len::<Punct>(input).map(|(op, len)| (Rule::Punct(op), len)),
        (input.starts_with("r\"") || input.starts_with("R\"")).then(|| (Rule::RawString, 2)),
    ];
    let literals = [
        (Rule::Ether, literal::ether(input)),
        (Rule::Ipv4, literal::ipv4(input)),
        (Rule::Ipv6, literal::ipv6(input)),
        (Rule::ColonBytes, literal::colon_bytes(input)),
        (Rule::DashBytes, literal::separated_bytes(input, '-')),
        (Rule::DotBytes, literal::separated_bytes(input, '.')),
        (Rule::HexRun, literal::hex_run(input)),
        (Rule::Identifier, literal::identifier(input)),
    ];

    operators
        .into_iter()
        .flatten()
        .chain(
            literals
                .into_iter()
                .filter_map(|(rule, len)| len.map(|len| (rule, len))),
        )
        .fold(None, |best: Option<(Rule, usize)>, (rule, len)| match best {
            Some((_, best_len)) if best_len >= len => best,
            _ => Some((rule, len)),
        })
}

/// Scanner over a single filter string.
///
/// A scanner is created for every compilation and owns the buffer for the
/// quoted literal being scanned.
pub struct Scanner<'i, 'd> {
    input: &'i str,
    rest: &'i str,
    mode: Mode,
    raw: bool,
    buffer: Vec<u8>,
    location: Location,
    literal_start: Location,
    diagnostics: &'d mut dyn Diagnostics,
}

impl<'i, 'd> Scanner<'i, 'd> {
    /// Creates a scanner in default mode at the start of `input`.
    pub fn new(input: &'i str, diagnostics: &'d mut dyn Diagnostics) -> Self {
        Scanner {
            input,
            rest: input,
            mode: Mode::Default,
            raw: false,
            buffer: Vec::new(),
            location: Location::default(),
            literal_start: Location::default(),
            diagnostics,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The whole input being scanned.
    pub fn input(&self) -> &'i str {
        self.input
    }

    /// Empty slice at the end of the input.
    pub fn end(&self) -> &'i str {
        &self.input[self.input.len()..]
    }

    /// Reports a non-fatal warning.
    pub fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.warn(Warning {
            message: message.into(),
            span,
        });
    }

    fn set_mode(&mut self, mode: Mode) {
        log::trace!(
            "scanner mode {:?} -> {:?} at column {}",
            self.mode,
            mode,
            self.location.offset()
        );
        self.mode = mode;
    }

    fn consume(&mut self, len: usize) -> (&'i str, Span) {
        let (text, rest) = self.rest.split_at(len);
        self.rest = rest;
        (text, self.location.advance(len))
    }

    fn token(&mut self, kind: TokenKind, len: usize) -> Token<'i> {
        let (lexeme, span) = self.consume(len);
        Token { kind, lexeme, span }
    }

    fn literal_text(&self) -> &'i str {
        &self.input[self.literal_start.offset()..self.location.offset()]
    }

    fn literal_token(&self, kind: TokenKind) -> Token<'i> {
        Token {
            kind,
            lexeme: self.literal_text(),
            span: self.literal_start.until(&self.location),
        }
    }

    fn open_literal(&mut self, mode: Mode, prefix_len: usize, raw: bool) {
        self.literal_start = self.location;
        self.raw = raw;
        self.buffer.clear();
        self.consume(prefix_len);
        self.set_mode(mode);
    }

    fn fail(&self, kind: LexErrorKind) -> LexError<'i> {
        let span = match kind {
            LexErrorKind::MissingFinalQuote => &self.input[self.literal_start.offset()..],
            LexErrorKind::ExpectedLayerIndex => {
                &self.rest[..self.rest.chars().next().map_or(0, char::len_utf8)]
            }
            _ => self.end(),
        };
        (kind, span)
    }

    fn next_char_len(&self) -> usize {
        self.rest.chars().next().map_or(0, char::len_utf8)
    }

    /// Scans the next token, or returns `None` at the end of input.
    pub fn next_token(&mut self) -> Result<Option<Token<'i>>, LexError<'i>> {
        loop {
            let class = CharClass::of(self.rest.chars().next());
            match dispatch(self.mode, class) {
                Action::Finish => return Ok(None),
                Action::SkipBlank => {
                    let len = count_while(self.rest, usize::MAX, |c| {
                        CharClass::of(Some(c)) == CharClass::Blank
                    });
                    self.consume(len);
                }
                Action::OpenString => self.open_literal(Mode::DQuote, 1, false),
                Action::OpenChar => self.open_literal(Mode::SQuote, 1, false),
                Action::OpenLayer => {
                    self.set_mode(Mode::Layer);
                    return Ok(Some(self.token(TokenKind::Hash, 1)));
                }
                Action::OpenRange => {
                    self.set_mode(Mode::Range);
                    return Ok(Some(self.token(TokenKind::LBracket, 1)));
                }
                Action::Recognize => {
                    if let Some(token) = self.recognize()? {
                        return Ok(Some(token));
                    }
                }
                Action::LayerIndex => {
                    let len = count_while(self.rest, usize::MAX, |c| c.is_ascii_digit());
                    self.set_mode(Mode::Default);
                    return Ok(Some(self.token(TokenKind::LayerIndex, len)));
                }
                Action::RangeFragment => {
                    let len = count_while(self.rest, usize::MAX, |c| c != ']' && c != ',');
                    return Ok(Some(self.token(TokenKind::RangeFragment, len)));
                }
                Action::RangeComma => {
                    return Ok(Some(self.token(TokenKind::Punct(Punct::Comma), 1)));
                }
                Action::CloseRange => {
                    self.set_mode(Mode::Default);
                    return Ok(Some(self.token(TokenKind::RBracket, 1)));
                }
                Action::StringRun => {
                    let len = count_while(self.rest, usize::MAX, |c| c != '"' && c != '\\');
                    let (text, _) = self.consume(len);
                    self.buffer.extend_from_slice(text.as_bytes());
                }
                Action::StringEscape if self.raw => {
                    let len = 1 + self.rest[1..].chars().next().map_or(0, char::len_utf8);
                    let (text, _) = self.consume(len);
                    self.buffer.extend_from_slice(text.as_bytes());
                }
                Action::StringEscape => {
                    if self.rest.len() == 1 {
                        return Err(self.fail(LexErrorKind::MissingFinalQuote));
                    }
                    let (escaped, rest) = lex_escape(self.rest, false)?;
                    self.consume(self.rest.len() - rest.len());
                    escaped.push_to(&mut self.buffer);
                }
                Action::CloseString => {
                    self.consume(1);
                    self.set_mode(Mode::Default);
                    let value = mem::take(&mut self.buffer);
                    let raw = self.raw;
                    return Ok(Some(self.literal_token(TokenKind::String { value, raw })));
                }
                Action::CharRun => {
                    let len = count_while(self.rest, usize::MAX, |c| c != '\'' && c != '\\');
                    self.consume(len);
                }
                Action::CharEscape => {
                    let len = 1 + self.rest[1..].chars().next().map_or(0, char::len_utf8);
                    self.consume(len);
                }
                Action::CloseChar => {
                    self.consume(1);
                    self.set_mode(Mode::Default);
                    let value = lex_char_constant(self.literal_text())?;
                    return Ok(Some(self.literal_token(TokenKind::Char(value))));
                }
                Action::Fail(failure) => return Err(self.fail(failure.into())),
            }
        }
    }

    fn recognize(&mut self) -> Result<Option<Token<'i>>, LexError<'i>> {
        let (rule, len) = match longest_match(self.rest) {
            Some(found) => found,
            None => {
                let len = self.next_char_len();
                let text = &self.rest[..len];
                return Err(if text.chars().any(char::is_control) {
                    (LexErrorKind::NonPrintable, text)
                } else {
                    (LexErrorKind::UnexpectedToken(text.to_owned()), text)
                });
            }
        };

        let kind = match rule {
            Rule::DeprecatedAnyNe => {
                let token = self.token(TokenKind::Test(TestOp::AnyNe), len);
                self.warn("\"~=\" is deprecated, use \"!==\" instead", token.span);
                return Ok(Some(token));
            }
            Rule::RawString => {
                self.open_literal(Mode::DQuote, len, true);
                return Ok(None);
            }
            Rule::Test(op) => TokenKind::Test(op),
            Rule::Logical(op) => TokenKind::Logical(op),
            Rule::Unary(op) => TokenKind::Unary(op),
            Rule::Arith(op) => TokenKind::Arith(op),
            Rule::Punct(punct) => TokenKind::Punct(punct),
            Rule::Ether => TokenKind::Literal(LiteralShape::Ether),
            Rule::Ipv4 => TokenKind::Literal(LiteralShape::Ipv4),
            Rule::Ipv6 => TokenKind::Literal(LiteralShape::Ipv6),
            Rule::ColonBytes if self.rest.starts_with(':') => {
                TokenKind::Literal(LiteralShape::Bytes)
            }
            Rule::HexRun => TokenKind::Literal(LiteralShape::HexRun),
            Rule::ColonBytes | Rule::DashBytes | Rule::DotBytes => TokenKind::Unparsed,
            Rule::Identifier if self.rest.starts_with('.') => {
                let mut token = self.token(TokenKind::Field, len);
                token.lexeme = &token.lexeme[1..];
                return Ok(Some(token));
            }
            Rule::Identifier => TokenKind::Unparsed,
        };
        Ok(Some(self.token(kind, len)))
    }
}

/// A scanner with one token of lookahead, as used by the parser.
pub struct TokenStream<'i, 'd> {
    scanner: Scanner<'i, 'd>,
    peeked: Option<Option<Token<'i>>>,
    last: Span,
}

impl<'i, 'd> TokenStream<'i, 'd> {
    pub fn new(input: &'i str, diagnostics: &'d mut dyn Diagnostics) -> Self {
        TokenStream {
            scanner: Scanner::new(input, diagnostics),
            peeked: None,
            last: Span::default(),
        }
    }

    /// Looks at the next token without consuming it.
    pub fn peek(&mut self) -> Result<Option<&Token<'i>>, LexError<'i>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scanner.next_token()?);
        }
        Ok(self.peeked.as_ref().and_then(Option::as_ref))
    }

    /// Consumes the next token.
    pub fn next(&mut self) -> Result<Option<Token<'i>>, LexError<'i>> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scanner.next_token()?,
        };
        if let Some(token) = &token {
            self.last = token.span;
        }
        Ok(token)
    }

    /// Span of the last consumed token.
    pub fn last_span(&self) -> Span {
        self.last
    }

    /// Consumes the next token, failing at the end of input.
    pub fn expect_token(&mut self) -> Result<Token<'i>, LexError<'i>> {
        let end = self.end();
        self.next()?.ok_or((LexErrorKind::UnexpectedEof, end))
    }

    /// Consumes the next token if `f` accepts it.
    pub fn next_if(
        &mut self,
        f: impl FnOnce(&TokenKind) -> bool,
    ) -> Result<Option<Token<'i>>, LexError<'i>> {
        let accepted = match self.peek()? {
            Some(token) => f(&token.kind),
            None => false,
        };
        if accepted {
            self.next()
        } else {
            Ok(None)
        }
    }

    /// Consumes the next token if it is the given punctuation.
    pub fn eat_punct(&mut self, punct: Punct) -> Result<Option<Token<'i>>, LexError<'i>> {
        self.next_if(|kind| *kind == TokenKind::Punct(punct))
    }

    pub fn input(&self) -> &'i str {
        self.scanner.input()
    }

    pub fn end(&self) -> &'i str {
        self.scanner.end()
    }

    /// Slice of the input covered by `span`.
    pub fn text(&self, span: Span) -> &'i str {
        &self.scanner.input()[span.range()]
    }

    pub fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.scanner.warn(message, span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> Result<Vec<(TokenKind, &str)>, LexError<'_>> {
        let mut warnings = Vec::new();
        scan_with_warnings(input, &mut warnings)
    }

    fn scan_with_warnings<'i>(
        input: &'i str,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<(TokenKind, &'i str)>, LexError<'i>> {
        let mut scanner = Scanner::new(input, warnings);
        let mut tokens = Vec::new();
        while let Some(token) = scanner.next_token()? {
            tokens.push((token.kind, token.lexeme));
        }
        Ok(tokens)
    }

    fn string(value: &[u8], raw: bool) -> TokenKind {
        TokenKind::String {
            value: value.to_vec(),
            raw,
        }
    }

    #[test]
    fn test_dispatch() {
        assert_eq!(dispatch(Mode::Default, CharClass::Hash), Action::OpenLayer);
        assert_eq!(
            dispatch(Mode::Layer, CharClass::Other),
            Action::Fail(Failure::ExpectedLayerIndex)
        );
        assert_eq!(dispatch(Mode::Range, CharClass::Hash), Action::RangeFragment);
        assert_eq!(dispatch(Mode::DQuote, CharClass::Hash), Action::StringRun);
        assert_eq!(
            dispatch(Mode::SQuote, CharClass::Eof),
            Action::Fail(Failure::MissingFinalQuote)
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            scan("a==b and !c").unwrap(),
            vec![
                (TokenKind::Unparsed, "a"),
                (TokenKind::Test(TestOp::AnyEq), "=="),
                (TokenKind::Unparsed, "b"),
                (TokenKind::Logical(LogicalOp::And), "and"),
                (TokenKind::Unary(UnaryOp::Not), "!"),
                (TokenKind::Unparsed, "c"),
            ]
        );
        assert_eq!(
            scan("x !== y === z").unwrap()[1].0,
            TokenKind::Test(TestOp::AnyNe)
        );
        assert_eq!(
            scan("x === y").unwrap()[1].0,
            TokenKind::Test(TestOp::AllEq)
        );
        // words that merely start like an operator are identifiers
        assert_eq!(scan("inner").unwrap(), vec![(TokenKind::Unparsed, "inner")]);
        assert_eq!(scan("android").unwrap(), vec![(TokenKind::Unparsed, "android")]);
    }

    #[test]
    fn test_deprecated_operator() {
        let mut warnings = Vec::new();
        assert_eq!(
            scan_with_warnings("a ~= b", &mut warnings).unwrap()[1],
            (TokenKind::Test(TestOp::AnyNe), "~=")
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].span, Span::new(2, 2));
    }

    #[test]
    fn test_address_literals() {
        assert_eq!(
            scan("00:11:22:33:44:55 10.0.0.0/8 fe80::1/64").unwrap(),
            vec![
                (TokenKind::Literal(LiteralShape::Ether), "00:11:22:33:44:55"),
                (TokenKind::Literal(LiteralShape::Ipv4), "10.0.0.0/8"),
                (TokenKind::Literal(LiteralShape::Ipv6), "fe80::1/64"),
            ]
        );
        assert_eq!(
            scan("aa:bb:cc :aa:bb aa-bb aa.bb :aabb").unwrap(),
            vec![
                (TokenKind::Unparsed, "aa:bb:cc"),
                (TokenKind::Literal(LiteralShape::Bytes), ":aa:bb"),
                (TokenKind::Unparsed, "aa-bb"),
                (TokenKind::Unparsed, "aa.bb"),
                (TokenKind::Literal(LiteralShape::HexRun), ":aabb"),
            ]
        );
    }

    #[test]
    fn test_fields() {
        assert_eq!(
            scan(".tcp.port tcp.port").unwrap(),
            vec![(TokenKind::Field, "tcp.port"), (TokenKind::Unparsed, "tcp.port")]
        );
    }

    #[test]
    fn test_layers_and_ranges() {
        assert_eq!(
            scan("ip.src#2 tcp[0:2,-1]").unwrap(),
            vec![
                (TokenKind::Unparsed, "ip.src"),
                (TokenKind::Hash, "#"),
                (TokenKind::LayerIndex, "2"),
                (TokenKind::Unparsed, "tcp"),
                (TokenKind::LBracket, "["),
                (TokenKind::RangeFragment, "0:2"),
                (TokenKind::Punct(Punct::Comma), ","),
                (TokenKind::RangeFragment, "-1"),
                (TokenKind::RBracket, "]"),
            ]
        );
        assert_eq!(
            scan("ip#[1-2]").unwrap()[2..],
            [
                (TokenKind::LBracket, "["),
                (TokenKind::RangeFragment, "1-2"),
                (TokenKind::RBracket, "]"),
            ]
        );
        assert_eq!(
            scan("ip#x"),
            Err((LexErrorKind::ExpectedLayerIndex, "x"))
        );
        assert_eq!(
            scan("tcp.port[0:2"),
            Err((LexErrorKind::MissingRightBracket, ""))
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            scan(r#""a\x41\101\n" r"a\d""#).unwrap(),
            vec![
                (string(b"aAA\n", false), r#""a\x41\101\n""#),
                (string(br"a\d", true), r#"r"a\d""#),
            ]
        );
        assert_eq!(scan(r#""\377""#).unwrap()[0].0, string(&[0xFF], false));
        assert_eq!(
            scan(r#""\400""#),
            Err((LexErrorKind::OctalEscapeOutOfRange, r"\400"))
        );
        assert_eq!(
            scan(r#"x == "abc"#),
            Err((LexErrorKind::MissingFinalQuote, r#""abc"#))
        );
        assert_eq!(
            scan(r#""abc\"#),
            Err((LexErrorKind::MissingFinalQuote, r#""abc\"#))
        );
    }

    #[test]
    fn test_raw_string_backslashes() {
        assert_eq!(
            scan(r#"r"a\\""#).unwrap(),
            vec![(string(br"a\\", true), r#"r"a\\""#)]
        );
        assert_eq!(
            scan(r#"r"a\""#),
            Err((LexErrorKind::MissingFinalQuote, r#"r"a\""#))
        );
        assert_eq!(
            scan(r#"R"\"q""#).unwrap(),
            vec![(string(br#"\"q"#, true), r#"R"\"q""#)]
        );
    }

    #[test]
    fn test_chars() {
        assert_eq!(
            scan(r"'a' '\x41' '\''").unwrap(),
            vec![
                (TokenKind::Char(0x61), "'a'"),
                (TokenKind::Char(0x41), r"'\x41'"),
                (TokenKind::Char(0x27), r"'\''"),
            ]
        );
        assert_eq!(scan("''"), Err((LexErrorKind::EmptyCharConstant, "''")));
        assert_eq!(scan("'ab'"), Err((LexErrorKind::CharConstantTooLong, "'ab'")));
        assert_eq!(scan("'a"), Err((LexErrorKind::MissingFinalQuote, "'a")));
    }

    #[test]
    fn test_unexpected_characters() {
        assert_eq!(
            scan("a == @"),
            Err((LexErrorKind::UnexpectedToken("@".into()), "@"))
        );
        assert_eq!(scan("a \u{1} b"), Err((LexErrorKind::NonPrintable, "\u{1}")));
    }

    #[test]
    fn test_spans() {
        let mut warnings = Vec::new();
        let mut scanner = Scanner::new(r#"  x  "ab""#, &mut warnings);
        let x = scanner.next_token().unwrap().unwrap();
        assert_eq!(x.span, Span::new(2, 1));
        let s = scanner.next_token().unwrap().unwrap();
        assert_eq!(s.span, Span::new(5, 4));
        assert_eq!(scanner.next_token(), Ok(None));
        assert_eq!(scanner.mode(), Mode::Default);
    }
}
