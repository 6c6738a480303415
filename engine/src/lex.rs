use crate::scheme::UnknownFieldError;
use cidr::errors::NetworkParseError;
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// LexErrorKind occurs when the filter text cannot be scanned, resolved or
/// parsed.
#[derive(Debug, PartialEq, Error)]
pub enum LexErrorKind {
    /// Expected the next token to be of a certain class
    #[error("expected {0}")]
    ExpectedName(&'static str),

    /// Expected the next token to be a specific punctuation
    #[error("expected literal {0:?}")]
    ExpectedLiteral(&'static str),

    /// A token that doesn't fit anywhere in the grammar
    #[error("unexpected token \"{0}\"")]
    UnexpectedToken(String),

    /// Input ended while the grammar still expected something
    #[error("unexpected end of filter")]
    UnexpectedEof,

    /// A control character outside of a quoted literal
    #[error("non-printable characters are only allowed inside quotes")]
    NonPrintable,

    /// Layer selector not followed by a digit or a bracket
    #[error("expected digit or \"[\"")]
    ExpectedLayerIndex,

    /// Input ended inside `[...]`
    #[error("missing right bracket")]
    MissingRightBracket,

    /// Input ended inside a quoted string or character constant
    #[error("missing final quote")]
    MissingFinalQuote,

    /// Backslash followed by a character that is not a known escape
    #[error("invalid character escape sequence")]
    InvalidCharacterEscape,

    /// Octal escape with a value above 255
    #[error("octal escape sequence exceeds \\377")]
    OctalEscapeOutOfRange,

    /// Octal escape in a character constant without exactly three digits
    #[error("malformed octal escape sequence, expected three octal digits")]
    MalformedOctalEscape,

    /// `\x` without hexadecimal digits after it
    #[error("expected one or two hex digits after \\x")]
    MalformedHexEscape,

    /// `\u` or `\U` without the exact number of hexadecimal digits
    #[error("expected {expected} hex digits in universal character name")]
    MalformedUniversalCharacterName {
        /// Required number of hex digits
        expected: usize,
    },

    /// A universal character name naming a forbidden code point
    #[error("{0} is not a valid universal character name")]
    InvalidUniversalCharacterName(String),

    /// `''`
    #[error("empty character constant")]
    EmptyCharConstant,

    /// More than one character between single quotes
    #[error("character constant is too long")]
    CharConstantTooLong,

    /// A control character between single quotes
    #[error("non-printable character in character constant")]
    NonPrintableCharConstant,

    /// The token could not be parsed as an integer
    #[error("{err} while parsing with radix {radix}")]
    ParseInt {
        /// The error that occurred parsing the token as an int
        #[source]
        err: ParseIntError,
        /// The base of the number
        radix: u32,
    },

    /// The token could not be parsed as a floating point number
    #[error("{0}")]
    ParseFloat(#[source] ParseFloatError),

    /// Expected the token to be an IPv4 or IPv6 address, optionally followed
    /// by a prefix length
    #[error("{0}")]
    ParseNetwork(#[source] NetworkParseError),

    /// A byte string with a dangling hex digit
    #[error("byte string must have an even number of hex digits")]
    OddHexDigits,

    /// The pattern of a `matches` test failed to compile
    #[error("{0}")]
    ParseRegex(#[source] regex::Error),

    /// The token refers to a field that is not present in the Scheme
    #[error("{0}")]
    UnknownField(#[source] UnknownFieldError),

    /// A slice or layer range that isn't well formed
    #[error("\"{0}\" is not a valid range")]
    InvalidRange(String),

    /// `#0` or a layer range reaching below the first layer
    #[error("layer index must be a positive integer")]
    InvalidLayerIndex,

    /// `#N` applied to something other than a field
    #[error("layer selectors can only be applied to fields")]
    LayerOnNonField,

    /// `a == b == c`
    #[error("comparisons cannot be chained")]
    ChainedComparison,

    /// `in {}`
    #[error("empty set")]
    EmptySet,
}

pub type LexError<'i> = (LexErrorKind, &'i str);

pub type LexResult<'i, T> = Result<(T, &'i str), LexError<'i>>;

pub trait Lex<'i>: Sized {
    fn lex(input: &'i str) -> LexResult<'i, Self>;
}

pub fn expect<'i>(input: &'i str, s: &'static str) -> Result<&'i str, LexError<'i>> {
    if let Some(rest) = input.strip_prefix(s) {
        Ok(rest)
    } else {
        Err((LexErrorKind::ExpectedLiteral(s), input))
    }
}

/// This macro generates enum declaration + lexer implementation.
///
/// Spellings are tried in declaration order, so a spelling that is a prefix
/// of another one (`==` and `===`) must come after it.
macro_rules! lex_enum {
    // Branch for handling `"some_string" | "other_string" => VariantName`.
    //
    // Creates a unit variant `VariantName`.
    //
    // On the lexer side, tries to parse either of the given string values,
    // and returns the variant if any of them succeeded.
    (@decl $preamble:tt $name:ident $input:ident { $($decl:tt)* } { $($expr:tt)* } {
        $(#[$meta:meta])* $($s:literal)|+ => $item:ident,
        $($rest:tt)*
    }) => {
        lex_enum!(@decl $preamble $name $input {
            $($decl)*
            $(#[$meta])*
            $item,
        } {
            $($expr)*
            $(if let Ok($input) = $crate::lex::expect($input, $s) {
                return Ok(($name::$item, $input));
            })+
        } { $($rest)* });
    };

    // Internal finish point for declaration + lexer generation.
    //
    // This is invoked when no more variants are left to process.
    // At this point declaration and lexer body are considered complete.
    (@decl { $($preamble:tt)* } $name:ident $input:ident $decl:tt { $($expr:stmt)* } {}) => {
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, serde::Serialize)]
        $($preamble)*
        pub enum $name $decl

        impl<'i> $crate::lex::Lex<'i> for $name {
            fn lex($input: &'i str) -> $crate::lex::LexResult<'i, Self> {
                $($expr)*
                Err((
                    $crate::lex::LexErrorKind::ExpectedName(stringify!($name)),
                    $input
                ))
            }
        }
    };

    // The public entry point to the macro.
    ($(#[$meta:meta])* $name:ident $items:tt) => {
        lex_enum!(@decl {
            $(#[$meta])*
        } $name input {} {} $items);
    };
}

pub fn span<'i>(input: &'i str, rest: &'i str) -> &'i str {
    &input[..input.len() - rest.len()]
}

/// Length of the longest prefix of `input` consisting of characters accepted
/// by `f`, capped at `max` characters.
pub fn count_while<F: Fn(char) -> bool>(input: &str, max: usize, f: F) -> usize {
    input
        .char_indices()
        .take(max)
        .find(|&(_, c)| !f(c))
        .map_or_else(
            || input.chars().take(max).map(char::len_utf8).sum(),
            |(i, _)| i,
        )
}

#[cfg(test)]
macro_rules! assert_ok {
    ($s:expr, $res:expr, $rest:expr) => {{
        let expr = $s.unwrap();
        assert_eq!(expr, ($res, $rest));
        expr.0
    }};

    ($s:expr, $res:expr) => {
        assert_ok!($s, $res, "")
    };
}

#[cfg(test)]
macro_rules! assert_err {
    ($s:expr, $kind:expr, $span:expr) => {
        assert_eq!($s, Err(($kind, $span)))
    };
}

#[cfg(test)]
macro_rules! assert_json {
    ($expr:expr, $json:tt) => {{
        let json = ::serde_json::to_value(&$expr).unwrap();
        assert_eq!(json, ::serde_json::json!($json));
        json
    }};
}

#[test]
fn test_count_while() {
    assert_eq!(count_while("0777x", 3, |c| c.is_digit(8)), 3);
    assert_eq!(count_while("07", 3, |c| c.is_digit(8)), 2);
    assert_eq!(count_while("x", 3, |c| c.is_digit(8)), 0);
}
