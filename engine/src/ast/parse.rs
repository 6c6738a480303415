use super::{logical_expr::LogicalExpr, FilterAst};
use crate::{
    diagnostics::{Diagnostics, LogDiagnostics},
    lex::{LexError, LexErrorKind},
    location::{offset_in, Span},
    op::Punct,
    scanner::{Token, TokenKind, TokenStream},
    scheme::{Field, Scheme},
};
use std::cmp::{max, min};
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

/// An opaque filter parsing error associated with the original input.
///
/// For now, you can just print it in a debug or a human-readable fashion.
#[derive(Debug, PartialEq)]
pub struct ParseError<'i> {
    /// The error that occurred when parsing the input
    pub(crate) kind: LexErrorKind,

    /// The input that caused the parse error
    pub(crate) input: &'i str,

    /// The line number on the input where the error occurred
    pub(crate) line_number: usize,

    /// The start of the bad input
    pub(crate) span_start: usize,

    /// The number of characters that span the bad input
    pub(crate) span_len: usize,
}

impl Error for ParseError<'_> {}

impl<'i> ParseError<'i> {
    /// Create a new ParseError for the input, LexErrorKind and span in the
    /// input.
    pub fn new(mut input: &'i str, (kind, span): (LexErrorKind, &'i str)) -> Self {
        let mut span_start = offset_in(input, span);

        let (line_number, line_start) = input[..span_start]
            .match_indices('\n')
            .map(|(pos, _)| pos + 1)
            .scan(0, |line_number, line_start| {
                *line_number += 1;
                Some((*line_number, line_start))
            })
            .last()
            .unwrap_or_default();

        input = &input[line_start..];

        span_start -= line_start;
        let mut span_len = span.len();

        if let Some(line_end) = input.find('\n') {
            input = &input[..line_end];
            span_len = min(span_len, line_end - span_start);
        }

        ParseError {
            kind,
            input,
            line_number,
            span_start,
            span_len,
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> &LexErrorKind {
        &self.kind
    }

    /// Zero-based line of the offending text.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Offending region, in bytes from the start of its line.
    pub fn span(&self) -> Span {
        Span::new(self.span_start, self.span_len)
    }
}

impl Display for ParseError<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Filter parsing error ({}:{}):",
            self.line_number + 1,
            self.span_start + 1
        )?;

        writeln!(f, "{}", self.input)?;

        for _ in 0..self.span_start {
            write!(f, " ")?;
        }

        for _ in 0..max(1, self.span_len) {
            write!(f, "^")?;
        }

        writeln!(f, " {}", self.kind)?;

        Ok(())
    }
}

/// Parser settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserSettings {
    /// Approximate size of the cache used by the DFA of a regex.
    /// Default: 2MB
    pub regex_dfa_size_limit: usize,
    /// Approximate size limit of the compiled regular expression.
    /// Default: 10MB
    pub regex_compiled_size_limit: usize,
}

impl Default for ParserSettings {
    #[inline]
    fn default() -> Self {
        Self {
            // Default value extracted from the regex crate.
            regex_compiled_size_limit: 10 * (1 << 20),
            // Default value extracted from the regex crate.
            regex_dfa_size_limit: 2 * (1 << 20),
        }
    }
}

/// A structure used to drive parsing of an expression into a [`FilterAst`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterParser<'s> {
    pub(crate) scheme: &'s Scheme,
    pub(crate) settings: ParserSettings,
}

impl<'s> FilterParser<'s> {
    /// Creates a new parser with default settings.
    #[inline]
    pub fn new(scheme: &'s Scheme) -> Self {
        Self {
            scheme,
            settings: ParserSettings::default(),
        }
    }

    /// Creates a new parser with the specified settings.
    #[inline]
    pub fn with_settings(scheme: &'s Scheme, settings: ParserSettings) -> Self {
        Self { scheme, settings }
    }

    /// Returns the [`Scheme`](struct@Scheme) for which this parser has been constructor for.
    #[inline]
    pub fn scheme(&self) -> &'s Scheme {
        self.scheme
    }

    /// Parses a filter expression into an AST form.
    ///
    /// Warnings are forwarded to the `log` crate.
    pub fn parse<'i>(&self, input: &'i str) -> Result<FilterAst<'s>, ParseError<'i>> {
        self.parse_with_diagnostics(input, &mut LogDiagnostics)
    }

    /// Parses a filter expression into an AST form, reporting warnings to
    /// `diagnostics`.
    pub fn parse_with_diagnostics<'i>(
        &self,
        input: &'i str,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<FilterAst<'s>, ParseError<'i>> {
        log::debug!("compiling filter {:?}", input);

        let mut parser = Parser {
            settings: &self.settings,
            scheme: self.scheme,
            tokens: TokenStream::new(input, diagnostics),
        };

        LogicalExpr::parse(&mut parser)
            .and_then(|expr| match parser.tokens.next()? {
                None => Ok(expr),
                Some(token) => Err(parser.unexpected(&token)),
            })
            .map(|expr| FilterAst {
                scheme: self.scheme,
                expr,
            })
            .map_err(|err| {
                log::debug!("filter {:?} rejected: {}", input, err.0);
                ParseError::new(input, err)
            })
    }

    /// Retrieve parser settings.
    #[inline]
    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Set the approximate size limit of the compiled regular expression.
    #[inline]
    pub fn regex_set_compiled_size_limit(&mut self, regex_compiled_size_limit: usize) {
        self.settings.regex_compiled_size_limit = regex_compiled_size_limit;
    }

    /// Get the approximate size limit of the compiled regular expression.
    #[inline]
    pub fn regex_get_compiled_size_limit(&self) -> usize {
        self.settings.regex_compiled_size_limit
    }

    /// Set the approximate size of the cache used by the DFA of a regex.
    #[inline]
    pub fn regex_set_dfa_size_limit(&mut self, regex_dfa_size_limit: usize) {
        self.settings.regex_dfa_size_limit = regex_dfa_size_limit;
    }

    /// Get the approximate size of the cache used by the DFA of a regex.
    #[inline]
    pub fn regex_get_dfa_size_limit(&self) -> usize {
        self.settings.regex_dfa_size_limit
    }
}

/// State of a single compilation: the token stream plus what the grammar
/// needs to resolve names and compile patterns.
pub(crate) struct Parser<'p, 's, 'i, 'd> {
    pub settings: &'p ParserSettings,
    pub scheme: &'s Scheme,
    pub tokens: TokenStream<'i, 'd>,
}

impl<'p, 's, 'i, 'd> Parser<'p, 's, 'i, 'd> {
    /// Slice of the input covered by `span`.
    pub fn text(&self, span: Span) -> &'i str {
        self.tokens.text(span)
    }

    /// Kind of the next token, if any.
    pub fn peek_kind(&mut self) -> Result<Option<TokenKind>, LexError<'i>> {
        Ok(self.tokens.peek()?.map(|token| token.kind.clone()))
    }

    /// Start column of the next token, or the end of input.
    pub fn peek_start(&mut self) -> Result<usize, LexError<'i>> {
        let end = self.tokens.input().len();
        Ok(self.tokens.peek()?.map_or(end, |token| token.span.start))
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let end = self.tokens.last_span().end();
        Span::new(start, end.saturating_sub(start))
    }

    pub fn unexpected(&self, token: &Token<'i>) -> LexError<'i> {
        (
            LexErrorKind::UnexpectedToken(token.lexeme.to_owned()),
            self.text(token.span),
        )
    }

    /// Consumes the given punctuation or fails with "expected literal".
    pub fn expect_punct(&mut self, punct: Punct, name: &'static str) -> Result<Token<'i>, LexError<'i>> {
        match self.tokens.eat_punct(punct)? {
            Some(token) => Ok(token),
            None => {
                let span = match self.tokens.peek()? {
                    Some(token) => token.span,
                    None => Span::new(self.tokens.input().len(), 0),
                };
                Err((LexErrorKind::ExpectedLiteral(name), self.text(span)))
            }
        }
    }

    /// Resolves a token naming a field.
    pub fn field(&self, token: &Token<'i>) -> Result<Field<'s>, LexError<'i>> {
        self.scheme
            .get_field(token.lexeme)
            .map_err(|err| (LexErrorKind::UnknownField(err), token.lexeme))
    }

    pub fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.tokens.warn(message, span);
    }
}

#[test]
fn test_parse_error_display() {
    let scheme = Scheme! { tcp.port: Int };

    let err = FilterParser::new(&scheme)
        .parse("tcp.port == 1 and\nbogus.field")
        .unwrap_err();
    assert_eq!(err.line_number(), 1);
    assert_eq!(err.span(), Span::new(0, 11));
    assert_eq!(
        err.to_string(),
        "Filter parsing error (2:1):\n\
         bogus.field\n\
         ^^^^^^^^^^^ \"bogus.field\" is not a valid protocol or protocol field\n"
    );
}

#[test]
fn test_settings() {
    let scheme = Scheme! { http.host: Bytes };

    let mut parser = FilterParser::new(&scheme);
    assert_eq!(parser.settings(), &ParserSettings::default());
    assert!(parser.parse(r#"http.host matches "\\w{100}""#).is_ok());

    parser.regex_set_compiled_size_limit(16);
    assert_eq!(parser.regex_get_compiled_size_limit(), 16);
    parser.regex_set_dfa_size_limit(1 << 10);
    assert_eq!(parser.regex_get_dfa_size_limit(), 1 << 10);

    let err = parser.parse(r#"http.host matches "\\w{100}""#).unwrap_err();
    assert!(matches!(err.kind(), LexErrorKind::ParseRegex(_)));
    assert_eq!(err.span(), Span::new(18, 10));
}
