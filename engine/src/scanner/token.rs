use crate::{
    location::Span,
    op::{ArithOp, LogicalOp, Punct, TestOp, UnaryOp},
};

/// Shape of an address or byte literal recognized by the scanner.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LiteralShape {
    /// Six hex pairs, or three dotted quads.
    Ether,
    /// Dotted IPv4 address with an optional prefix length.
    Ipv4,
    /// IPv6 address with an optional prefix length.
    Ipv6,
    /// Colon-prefixed separated hex bytes, like `:aa:bb`.
    Bytes,
    /// Colon-prefixed run of hex digits, like `:aabb`.
    HexRun,
}

/// Class of a scanned token.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Punct(Punct),
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `#`
    Hash,
    Test(TestOp),
    Logical(LogicalOp),
    Unary(UnaryOp),
    Arith(ArithOp),
    /// An address or byte literal that can't be mistaken for anything else.
    Literal(LiteralShape),
    /// A word whose meaning depends on the scheme: a field, a number, a
    /// boolean or a byte string.
    Unparsed,
    /// `.name`, always a field.
    Field,
    /// A quoted string, already decoded.
    String { value: Vec<u8>, raw: bool },
    /// A character constant.
    Char(u32),
    /// Digits following `#`.
    LayerIndex,
    /// Text between `[`, `,` and `]`, validated by the parser.
    RangeFragment,
}

/// A token together with the text it was scanned from.
///
/// For [`TokenKind::Field`] the lexeme omits the leading dot while the span
/// still covers it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token<'i> {
    pub kind: TokenKind,
    pub lexeme: &'i str,
    pub span: Span,
}
