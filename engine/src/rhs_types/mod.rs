//! Literal and type resolution.
//!
//! Turns literal tokens into typed [`Literal`] values. Words the scanner
//! could not classify (numbers, booleans, byte strings) are resolved here
//! once the parser has ruled out a field name.

mod boolean;
mod bytes;
mod float;
mod int;
mod ip;
mod regex;
pub(crate) mod string;

pub use self::{bytes::Bytes, ip::IpLiteral, regex::Regex};

use self::{
    boolean::parse_bool,
    bytes::{parse_ether, parse_hex_run, parse_separated_bytes},
    float::parse_float,
    int::parse_int,
    ip::parse_ip,
};
use crate::{
    lex::{LexError, LexErrorKind},
    scanner::{LiteralShape, Token, TokenKind},
    types::{GetType, LhsValue, Type},
};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::borrow::Cow;

/// A typed constant appearing in a filter.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum Literal {
    /// An integer in any radix.
    Int(i64),
    /// A floating point number.
    Float(OrderedFloat<f64>),
    /// `true` or `false`.
    Bool(bool),
    /// Separated hex bytes or a hex run.
    Bytes(Bytes),
    /// A quoted string.
    String(Bytes),
    /// A character constant.
    Char(u32),
    /// A hardware address.
    Ether([u8; 6]),
    /// An address, or a network when a prefix length was given.
    Ip(IpLiteral),
}

impl GetType for Literal {
    fn get_type(&self) -> Type {
        match self {
            Literal::Int(_) | Literal::Char(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Bool(_) => Type::Bool,
            Literal::Bytes(_) | Literal::String(_) => Type::Bytes,
            Literal::Ether(_) => Type::Ether,
            Literal::Ip(_) => Type::Ip,
        }
    }
}

impl Literal {
    /// Value to compare field values against.
    pub fn to_value(&self) -> LhsValue<'_> {
        match self {
            Literal::Int(i) => LhsValue::Int(*i),
            Literal::Char(c) => LhsValue::Int(i64::from(*c)),
            Literal::Float(x) => LhsValue::Float(x.0),
            Literal::Bool(b) => LhsValue::Bool(*b),
            Literal::Bytes(bytes) | Literal::String(bytes) => {
                LhsValue::Bytes(Cow::Borrowed(&bytes[..]))
            }
            Literal::Ether(mac) => LhsValue::Ether(*mac),
            Literal::Ip(ip) => LhsValue::Ip(ip.addr()),
        }
    }
}

/// Resolves a token the scanner already identified as a literal.
///
/// Hex pairs such as `01.02.03.04` or eight colon-separated pairs also read
/// as addresses; against a byte-typed field they are taken as byte strings.
///
/// Returns `None` for tokens that aren't literals.
pub(crate) fn resolve_token<'i>(
    token: &Token<'i>,
    hint: Option<Type>,
) -> Option<Result<Literal, LexError<'i>>> {
    let text = token.lexeme;
    Some(match &token.kind {
        TokenKind::Literal(LiteralShape::Ether) => parse_ether(text).map(Literal::Ether),
        TokenKind::Literal(LiteralShape::Ipv4 | LiteralShape::Ipv6) => {
            match parse_separated_bytes(text) {
                Ok(bytes) if matches!(hint, Some(Type::Bytes | Type::Protocol)) => {
                    Ok(Literal::Bytes(bytes))
                }
                _ => parse_ip(text).map(Literal::Ip),
            }
        }
        TokenKind::Literal(LiteralShape::Bytes) => {
            parse_separated_bytes(&text[1..]).map(Literal::Bytes)
        }
        TokenKind::Literal(LiteralShape::HexRun) => parse_hex_run(&text[1..]).map(Literal::Bytes),
        TokenKind::String { value, .. } => Ok(Literal::String(value.clone().into())),
        TokenKind::Char(c) => Ok(Literal::Char(*c)),
        _ => return None,
    })
}

/// Resolves a word that isn't a field name.
///
/// When the type on the other side of the comparison is known, byte strings
/// take precedence for byte-typed fields so that `eth.type == 08` reads as a
/// single byte rather than as a number. Otherwise integers, floats, booleans
/// and byte strings are tried in that order.
pub(crate) fn resolve_unparsed(input: &str, hint: Option<Type>) -> Result<Literal, LexError<'_>> {
    let bytes = || parse_separated_bytes(input).map(Literal::Bytes);

    if matches!(hint, Some(Type::Bytes | Type::Protocol)) {
        if let Ok(literal) = bytes() {
            return Ok(literal);
        }
    }
    if hint == Some(Type::Ether) {
        if let Ok(mac) = parse_ether(input) {
            return Ok(Literal::Ether(mac));
        }
    }

    parse_int(input)
        .map(Literal::Int)
        .or_else(|_| parse_float(input).map(Literal::Float))
        .or_else(|err| parse_bool(input).map(Literal::Bool).ok_or(err))
        .or_else(|_| bytes())
        .map_err(|_| (LexErrorKind::ExpectedName("literal"), input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Span;
    use std::net::IpAddr;

    fn token(kind: TokenKind, lexeme: &str) -> Token<'_> {
        Token {
            kind,
            lexeme,
            span: Span::new(0, lexeme.len()),
        }
    }

    #[test]
    fn test_resolve_token() {
        assert_eq!(
            resolve_token(&token(TokenKind::Literal(LiteralShape::Bytes), ":aa:bb"), None),
            Some(Ok(Literal::Bytes(vec![0xAA, 0xBB].into())))
        );
        assert_eq!(
            resolve_token(&token(TokenKind::Literal(LiteralShape::HexRun), ":aab"), None),
            Some(Err((LexErrorKind::OddHexDigits, "aab")))
        );
        assert_eq!(
            resolve_token(&token(TokenKind::Char(0x41), "'A'"), None),
            Some(Ok(Literal::Char(0x41)))
        );
        let ip = resolve_token(&token(TokenKind::Literal(LiteralShape::Ipv4), "10.0.0.1"), None)
            .unwrap()
            .unwrap();
        assert_eq!(ip.to_value(), LhsValue::Ip(IpAddr::from([10, 0, 0, 1])));
        assert_eq!(resolve_token(&token(TokenKind::Unparsed, "x"), None), None);
    }

    #[test]
    fn test_resolve_address_shaped_bytes() {
        let dotted = token(TokenKind::Literal(LiteralShape::Ipv4), "01.02.03.04");
        assert_eq!(
            resolve_token(&dotted, Some(Type::Bytes)),
            Some(Ok(Literal::Bytes(vec![1, 2, 3, 4].into())))
        );
        assert!(matches!(
            resolve_token(&dotted, Some(Type::Ip)),
            Some(Err((LexErrorKind::ParseNetwork(_), "01.02.03.04")))
        ));

        let colons = token(
            TokenKind::Literal(LiteralShape::Ipv6),
            "01:02:03:04:05:06:07:08",
        );
        assert_eq!(
            resolve_token(&colons, Some(Type::Protocol)),
            Some(Ok(Literal::Bytes((1..=8).collect::<Vec<u8>>().into())))
        );
        assert!(matches!(
            resolve_token(&colons, None),
            Some(Ok(Literal::Ip(_)))
        ));

        let address = token(TokenKind::Literal(LiteralShape::Ipv4), "10.0.0.1");
        assert!(matches!(
            resolve_token(&address, Some(Type::Bytes)),
            Some(Ok(Literal::Ip(_)))
        ));
    }

    #[test]
    fn test_resolve_unparsed() {
        assert_eq!(resolve_unparsed("80", None), Ok(Literal::Int(80)));
        assert_eq!(resolve_unparsed("0x50", None), Ok(Literal::Int(80)));
        assert_eq!(
            resolve_unparsed("1.5", None),
            Ok(Literal::Float(OrderedFloat(1.5)))
        );
        assert_eq!(resolve_unparsed("TRUE", None), Ok(Literal::Bool(true)));
        assert_eq!(
            resolve_unparsed("aa:bb", None),
            Ok(Literal::Bytes(vec![0xAA, 0xBB].into()))
        );
        assert_eq!(
            resolve_unparsed("10", Some(Type::Bytes)),
            Ok(Literal::Bytes(vec![0x10].into()))
        );
        assert_eq!(
            resolve_unparsed("bogus", None),
            Err((LexErrorKind::ExpectedName("literal"), "bogus"))
        );
    }

    #[test]
    fn test_serialize() {
        assert_json!(Literal::Int(1), 1);
        assert_json!(Literal::String(b"ab".to_vec().into()), "ab");
        assert_json!(Literal::Ether([0, 1, 2, 3, 4, 5]), [0, 1, 2, 3, 4, 5]);
    }
}
