use crate::lex::{Lex, LexError, LexErrorKind};
use serde::{Serialize, Serializer};
use std::{
    borrow::Borrow,
    fmt::{self, Debug, Formatter},
    ops::Deref,
};

/// An owned byte string literal.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Hash)]
pub struct Bytes(Box<[u8]>);

impl From<Vec<u8>> for Bytes {
    fn from(src: Vec<u8>) -> Self {
        Bytes(src.into_boxed_slice())
    }
}

impl From<&[u8]> for Bytes {
    fn from(src: &[u8]) -> Self {
        src.to_vec().into()
    }
}

impl From<String> for Bytes {
    fn from(src: String) -> Self {
        src.into_bytes().into()
    }
}

impl Debug for Bytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for &b in self.iter() {
            match b {
                b'"' => write!(f, r#"\""#),
                b'\\' => write!(f, r"\\"),
                0x20..=0x7E => write!(f, "{}", b as char),
                _ => write!(f, r"\x{:02X}", b),
            }?;
        }
        write!(f, "\"")
    }
}

/// Printable strings serialize as text, anything else as `aa:bb:cc`.
impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(self) {
            Ok(s) if !s.chars().any(char::is_control) => ser.serialize_str(s),
            _ => ser.collect_str(&HexBytes(self)),
        }
    }
}

struct HexBytes<'a>(&'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Bytes {
    fn borrow(&self) -> &[u8] {
        self
    }
}

fn hex_byte(input: &str) -> Result<u8, LexError<'_>> {
    let digits = input.get(..2).unwrap_or(input);
    if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err((LexErrorKind::ExpectedName("hex byte"), digits));
    }
    u8::from_str_radix(digits, 16).map_err(|err| (LexErrorKind::ParseInt { err, radix: 16 }, digits))
}

lex_enum!(ByteSeparator {
    ":" => Colon,
    "-" => Dash,
    "." => Dot,
});

/// Parses hex pairs separated by `:`, `-` or `.`, such as `aa:bb:cc`. A
/// single pair may be followed by a dangling separator (`aa:`).
pub(crate) fn parse_separated_bytes(mut input: &str) -> Result<Bytes, LexError<'_>> {
    let mut res = Vec::new();
    loop {
        res.push(hex_byte(input)?);
        input = &input[2..];
        if input.is_empty() {
            return Ok(res.into());
        }
        let (_, rest) = ByteSeparator::lex(input)?;
        if rest.is_empty() && res.len() == 1 {
            return Ok(res.into());
        }
        input = rest;
    }
}

/// Parses a run of hex digits without separators, such as `aabbcc`.
pub(crate) fn parse_hex_run(input: &str) -> Result<Bytes, LexError<'_>> {
    if input.len() % 2 != 0 {
        return Err((LexErrorKind::OddHexDigits, input));
    }
    (0..input.len())
        .step_by(2)
        .map(|i| hex_byte(&input[i..]))
        .collect::<Result<Vec<_>, _>>()
        .map(Bytes::from)
}

/// Parses a hardware address: six separated pairs or `aabb.ccdd.eeff`.
pub(crate) fn parse_ether(input: &str) -> Result<[u8; 6], LexError<'_>> {
    let bytes = if input.len() == 14 && input.as_bytes()[4] == b'.' {
        let digits: String = input.split('.').collect();
        parse_hex_run(&digits).map_err(|(kind, _)| (kind, input))?
    } else {
        parse_separated_bytes(input)?
    };
    <[u8; 6]>::try_from(&bytes[..])
        .map_err(|_| (LexErrorKind::ExpectedName("hardware address"), input))
}

#[test]
fn test_separated() {
    assert_eq!(
        parse_separated_bytes("01:2e:f3-77.12"),
        Ok(Bytes::from(vec![0x01, 0x2E, 0xF3, 0x77, 0x12]))
    );
    assert_eq!(parse_separated_bytes("aa"), Ok(Bytes::from(vec![0xAA])));
    assert_eq!(parse_separated_bytes("aa:"), Ok(Bytes::from(vec![0xAA])));
    assert_eq!(
        parse_separated_bytes("01:4x"),
        Err((LexErrorKind::ExpectedName("hex byte"), "4x"))
    );
    assert_eq!(
        parse_separated_bytes("aa:bb:"),
        Err((LexErrorKind::ExpectedName("hex byte"), ""))
    );
    assert_eq!(
        parse_separated_bytes("aa;bb"),
        Err((LexErrorKind::ExpectedName("ByteSeparator"), ";bb"))
    );
}

#[test]
fn test_separators_are_equivalent() {
    let expected = parse_separated_bytes("aa:bb:cc").unwrap();
    assert_eq!(parse_separated_bytes("aa-bb-cc"), Ok(expected.clone()));
    assert_eq!(parse_separated_bytes("aa.bb.cc"), Ok(expected));
}

#[test]
fn test_hex_run() {
    assert_eq!(parse_hex_run("aabb"), Ok(Bytes::from(vec![0xAA, 0xBB])));
    assert_eq!(parse_hex_run("aab"), Err((LexErrorKind::OddHexDigits, "aab")));
}

#[test]
fn test_ether() {
    let mac = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
    assert_eq!(parse_ether("00:11:22:33:44:55"), Ok(mac));
    assert_eq!(parse_ether("00-11-22-33-44-55"), Ok(mac));
    assert_eq!(parse_ether("0011.2233.4455"), Ok(mac));
    assert_eq!(
        parse_ether("00:11:22"),
        Err((LexErrorKind::ExpectedName("hardware address"), "00:11:22"))
    );
}

#[test]
fn test_serialize() {
    assert_eq!(
        serde_json::to_value(Bytes::from("abc".to_owned())).unwrap(),
        serde_json::json!("abc")
    );
    assert_eq!(
        serde_json::to_value(Bytes::from(vec![0, 0xFF])).unwrap(),
        serde_json::json!("00:ff")
    );
}
