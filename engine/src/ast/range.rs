use super::parse::Parser;
use crate::{
    lex::{LexError, LexErrorKind},
    scanner::TokenKind,
};
use serde::{Serialize, Serializer};
use std::{
    fmt::{self, Display, Formatter},
    ops::{Range, RangeInclusive},
    str::FromStr,
};

/// A single slice specification inside `[...]`.
///
/// Negative offsets count back from the end of the value.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DRange {
    /// `offset:length`, or `:length` starting at 0.
    Length {
        /// First byte.
        start: i64,
        /// Number of bytes, never zero.
        len: u64,
    },
    /// `offset-end`, both ends included.
    Span {
        /// First byte.
        start: i64,
        /// Last byte.
        end: i64,
    },
    /// `offset:`, up to the end of the value.
    ToEnd {
        /// First byte.
        start: i64,
    },
    /// `offset`, a single byte.
    Single {
        /// The byte.
        start: i64,
    },
}

impl Display for DRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DRange::Length { start, len } => write!(f, "{}:{}", start, len),
            DRange::Span { start, end } => write!(f, "{}-{}", start, end),
            DRange::ToEnd { start } => write!(f, "{}:", start),
            DRange::Single { start } => write!(f, "{}", start),
        }
    }
}

impl Serialize for DRange {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(self)
    }
}

impl DRange {
    /// Parses one fragment. Surrounding blanks are ignored.
    pub(crate) fn parse(text: &str) -> Result<Self, LexError<'_>> {
        let text = text.trim();
        let invalid = || (LexErrorKind::InvalidRange(text.to_owned()), text);

        let offset = |s: &str| i64::from_str(s).map_err(|_| invalid());
        let length = |s: &str| match u64::from_str(s) {
            Ok(len) if len > 0 => Ok(len),
            _ => Err(invalid()),
        };

        if text.is_empty() {
            return Err(invalid());
        }

        if let Some((start, len)) = text.split_once(':') {
            return Ok(match (start, len) {
                ("", len) => DRange::Length {
                    start: 0,
                    len: length(len)?,
                },
                (start, "") => DRange::ToEnd {
                    start: offset(start)?,
                },
                (start, len) => DRange::Length {
                    start: offset(start)?,
                    len: length(len)?,
                },
            });
        }

        // the first character may be the sign of the start offset
        if let Some((pos, _)) = text.char_indices().skip(1).find(|&(_, c)| c == '-') {
            let (start, end) = text.split_at(pos);
            let (start, end) = (offset(start)?, offset(&end[1..])?);
            if start >= 0 && end >= 0 && end < start {
                return Err(invalid());
            }
            return Ok(DRange::Span { start, end });
        }

        Ok(DRange::Single {
            start: offset(text)?,
        })
    }

    /// Byte range selected from a value of `len` bytes, or `None` if the
    /// slice falls outside it.
    pub fn apply(&self, len: usize) -> Option<Range<usize>> {
        let total = i64::try_from(len).ok()?;
        let resolve = |offset: i64| {
            let offset = if offset < 0 { total + offset } else { offset };
            (0..=total).contains(&offset).then_some(offset)
        };

        let (start, end) = match *self {
            DRange::Length { start, len } => {
                let start = resolve(start)?;
                (start, start.checked_add(i64::try_from(len).ok()?)?)
            }
            DRange::Span { start, end } => (resolve(start)?, resolve(end)? + 1),
            DRange::ToEnd { start } => (resolve(start)?, total),
            DRange::Single { start } => {
                let start = resolve(start)?;
                (start, start + 1)
            }
        };

        if start > end || end > total {
            return None;
        }
        Some(start as usize..end as usize)
    }
}

/// Which occurrences of a field a layer selector keeps. Layers are
/// numbered from 1.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum LayerSpec {
    /// `#N`
    Index(u32),
    /// `#[...]`
    Ranges(Vec<RangeInclusive<u32>>),
}

impl LayerSpec {
    /// Whether values at `layer` are selected.
    pub fn contains(&self, layer: u32) -> bool {
        match self {
            LayerSpec::Index(index) => *index == layer,
            LayerSpec::Ranges(ranges) => ranges.iter().any(|range| range.contains(&layer)),
        }
    }

    pub(crate) fn parse_index(text: &str) -> Result<Self, LexError<'_>> {
        match u32::from_str(text) {
            Ok(index) if index > 0 => Ok(LayerSpec::Index(index)),
            _ => Err((LexErrorKind::InvalidLayerIndex, text)),
        }
    }

    pub(crate) fn from_ranges<'i>(ranges: Vec<(DRange, &'i str)>) -> Result<Self, LexError<'i>> {
        ranges
            .into_iter()
            .map(|(range, text)| {
                let invalid = || (LexErrorKind::InvalidLayerIndex, text);
                let layer = |n: i64| match u32::try_from(n) {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(invalid()),
                };
                Ok(match range {
                    DRange::Single { start } => layer(start)?..=layer(start)?,
                    DRange::Span { start, end } => layer(start)?..=layer(end)?,
                    DRange::ToEnd { start } => layer(start)?..=u32::MAX,
                    DRange::Length { start, len } => {
                        let start = layer(start)?;
                        let len = u32::try_from(len).map_err(|_| invalid())?;
                        start..=start.checked_add(len - 1).ok_or_else(invalid)?
                    }
                })
            })
            .collect::<Result<_, _>>()
            .map(LayerSpec::Ranges)
    }
}

/// Parses the fragments after an opening `[` up to and including the closing
/// `]`. Each range is returned with its source text.
pub(crate) fn parse_range_list<'i>(
    parser: &mut Parser<'_, '_, 'i, '_>,
) -> Result<Vec<(DRange, &'i str)>, LexError<'i>> {
    let mut ranges = Vec::new();
    loop {
        let token = parser.tokens.expect_token()?;
        match token.kind {
            TokenKind::RangeFragment => {
                ranges.push((DRange::parse(token.lexeme)?, token.lexeme.trim()));
            }
            _ => {
                return Err((
                    LexErrorKind::InvalidRange(token.lexeme.to_owned()),
                    token.lexeme,
                ))
            }
        }

        let token = parser.tokens.expect_token()?;
        match token.kind {
            TokenKind::RBracket => return Ok(ranges),
            TokenKind::Punct(_) => {}
            _ => {
                return Err((
                    LexErrorKind::InvalidRange(token.lexeme.to_owned()),
                    token.lexeme,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(DRange::parse("0:2"), Ok(DRange::Length { start: 0, len: 2 }));
        assert_eq!(DRange::parse(":4"), Ok(DRange::Length { start: 0, len: 4 }));
        assert_eq!(DRange::parse(" 3: "), Ok(DRange::ToEnd { start: 3 }));
        assert_eq!(DRange::parse("1-3"), Ok(DRange::Span { start: 1, end: 3 }));
        assert_eq!(DRange::parse("-4--1"), Ok(DRange::Span { start: -4, end: -1 }));
        assert_eq!(DRange::parse("-1"), Ok(DRange::Single { start: -1 }));
        assert_eq!(DRange::parse("7"), Ok(DRange::Single { start: 7 }));

        assert_err!(DRange::parse("0:0"), LexErrorKind::InvalidRange("0:0".into()), "0:0");
        assert_err!(DRange::parse("3-1"), LexErrorKind::InvalidRange("3-1".into()), "3-1");
        assert_err!(DRange::parse("a:b"), LexErrorKind::InvalidRange("a:b".into()), "a:b");
        assert_err!(DRange::parse(" "), LexErrorKind::InvalidRange("".into()), "");
    }

    #[test]
    fn test_apply() {
        assert_eq!(DRange::Length { start: 0, len: 2 }.apply(4), Some(0..2));
        assert_eq!(DRange::Length { start: 3, len: 2 }.apply(4), None);
        assert_eq!(DRange::Span { start: 1, end: 2 }.apply(4), Some(1..3));
        assert_eq!(DRange::Span { start: -2, end: -1 }.apply(4), Some(2..4));
        assert_eq!(DRange::ToEnd { start: 1 }.apply(4), Some(1..4));
        assert_eq!(DRange::Single { start: -1 }.apply(4), Some(3..4));
        assert_eq!(DRange::Single { start: 4 }.apply(4), None);
        assert_eq!(DRange::Single { start: -5 }.apply(4), None);
    }

    #[test]
    fn test_layers() {
        assert_eq!(LayerSpec::parse_index("2"), Ok(LayerSpec::Index(2)));
        assert_err!(LayerSpec::parse_index("0"), LexErrorKind::InvalidLayerIndex, "0");

        let spec = LayerSpec::from_ranges(vec![
            (DRange::Span { start: 1, end: 2 }, "1-2"),
            (DRange::ToEnd { start: 4 }, "4:"),
        ])
        .unwrap();
        assert!(spec.contains(2));
        assert!(!spec.contains(3));
        assert!(spec.contains(40));

        assert_err!(
            LayerSpec::from_ranges(vec![(DRange::Single { start: -1 }, "-1")]),
            LexErrorKind::InvalidLayerIndex,
            "-1"
        );
    }

    #[test]
    fn test_serialize() {
        assert_json!(DRange::Length { start: 0, len: 2 }, "0:2");
        assert_json!(LayerSpec::Index(3), 3);
    }
}
