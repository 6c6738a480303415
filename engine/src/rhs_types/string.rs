use crate::lex::{count_while, span, LexError, LexErrorKind, LexResult};

/// A decoded escape sequence.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Escaped {
    /// A single byte: C escapes, octal and `\x` escapes.
    Byte(u8),
    /// A code point named by `\u` or `\U`, stored as UTF-8.
    Char(char),
}

impl Escaped {
    pub fn push_to(self, buf: &mut Vec<u8>) {
        match self {
            Escaped::Byte(b) => buf.push(b),
            Escaped::Char(c) => {
                let mut utf8 = [0; 4];
                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }

    pub fn code_point(self) -> u32 {
        match self {
            Escaped::Byte(b) => b.into(),
            Escaped::Char(c) => c.into(),
        }
    }
}

// Control characters and surrogates can't be named; `$`, `@` and '`' can.
fn is_valid_universal_character(cp: u32) -> bool {
    match cp {
        0x24 | 0x40 | 0x60 => true,
        0x20..=0x7E => true,
        0xD800..=0xDFFF => false,
        0xA0..=0x10FFFF => true,
        _ => false,
    }
}

/// Decodes the escape sequence at the start of `input`, which must begin
/// with a backslash.
///
/// Character constants only accept octal escapes of exactly three digits,
/// quoted strings accept one to three.
pub(crate) fn lex_escape(input: &str, three_digit_octal: bool) -> LexResult<'_, Escaped> {
    let body = input
        .strip_prefix('\\')
        .ok_or((LexErrorKind::InvalidCharacterEscape, input))?;
    let mut chars = body.chars();
    let c = chars
        .next()
        .ok_or((LexErrorKind::MissingFinalQuote, input))?;
    let after = chars.as_str();

    let simple = match c {
        'a' => Some(0x07),
        'b' => Some(0x08),
        'f' => Some(0x0C),
        'n' => Some(b'\n'),
        'r' => Some(b'\r'),
        't' => Some(b'\t'),
        'v' => Some(0x0B),
        '\\' | '\'' | '"' => Some(c as u8),
        _ => None,
    };
    if let Some(b) = simple {
        return Ok((Escaped::Byte(b), after));
    }

    match c {
        '0'..='7' => {
            let (digits, rest) = body.split_at(count_while(body, 3, |c| c.is_digit(8)));
            let escape = span(input, rest);
            if three_digit_octal && digits.len() != 3 {
                return Err((LexErrorKind::MalformedOctalEscape, escape));
            }
            let value = u32::from_str_radix(digits, 8)
                .map_err(|err| (LexErrorKind::ParseInt { err, radix: 8 }, escape))?;
            match u8::try_from(value) {
                Ok(b) => Ok((Escaped::Byte(b), rest)),
                Err(_) => Err((LexErrorKind::OctalEscapeOutOfRange, escape)),
            }
        }
        'x' => {
            let (digits, rest) = after.split_at(count_while(after, 2, |c| c.is_ascii_hexdigit()));
            let escape = span(input, rest);
            if digits.is_empty() {
                return Err((LexErrorKind::MalformedHexEscape, escape));
            }
            u8::from_str_radix(digits, 16)
                .map(|b| (Escaped::Byte(b), rest))
                .map_err(|err| (LexErrorKind::ParseInt { err, radix: 16 }, escape))
        }
        'u' | 'U' => {
            let expected = if c == 'u' { 4 } else { 8 };
            let (digits, rest) =
                after.split_at(count_while(after, expected, |c| c.is_ascii_hexdigit()));
            let escape = span(input, rest);
            if digits.len() != expected {
                return Err((
                    LexErrorKind::MalformedUniversalCharacterName { expected },
                    escape,
                ));
            }
            let cp = u32::from_str_radix(digits, 16)
                .map_err(|err| (LexErrorKind::ParseInt { err, radix: 16 }, escape))?;
            match char::from_u32(cp) {
                Some(c) if is_valid_universal_character(cp) => Ok((Escaped::Char(c), rest)),
                _ => Err((
                    LexErrorKind::InvalidUniversalCharacterName(escape.to_owned()),
                    escape,
                )),
            }
        }
        _ => Err((LexErrorKind::InvalidCharacterEscape, span(input, after))),
    }
}

/// Decodes a character constant, quotes included, into its code point.
pub(crate) fn lex_char_constant(literal: &str) -> Result<u32, LexError<'_>> {
    let inner = literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or((LexErrorKind::MissingFinalQuote, literal))?;

    let (value, rest) = if inner.starts_with('\\') {
        let (escaped, rest) = lex_escape(inner, true)?;
        (escaped.code_point(), rest)
    } else {
        let mut chars = inner.chars();
        match chars.next() {
            None => return Err((LexErrorKind::EmptyCharConstant, literal)),
            Some(c) if c.is_control() => {
                return Err((
                    LexErrorKind::NonPrintableCharConstant,
                    span(inner, chars.as_str()),
                ))
            }
            Some(c) => (c.into(), chars.as_str()),
        }
    };

    if rest.is_empty() {
        Ok(value)
    } else {
        Err((LexErrorKind::CharConstantTooLong, literal))
    }
}

#[test]
fn test_simple_escapes() {
    assert_ok!(lex_escape(r"\n", false), Escaped::Byte(b'\n'));
    assert_ok!(lex_escape(r"\vx", false), Escaped::Byte(0x0B), "x");
    assert_ok!(lex_escape(r#"\""#, false), Escaped::Byte(b'"'));
    assert_err!(
        lex_escape(r"\q", false),
        LexErrorKind::InvalidCharacterEscape,
        r"\q"
    );
    assert_err!(lex_escape(r"\", false), LexErrorKind::MissingFinalQuote, r"\");
}

#[test]
fn test_octal_escapes() {
    assert_ok!(lex_escape(r"\377", false), Escaped::Byte(0xFF));
    assert_ok!(lex_escape(r"\0", false), Escaped::Byte(0));
    assert_ok!(lex_escape(r"\1234", false), Escaped::Byte(0o123), "4");
    assert_err!(
        lex_escape(r"\400", false),
        LexErrorKind::OctalEscapeOutOfRange,
        r"\400"
    );
    assert_err!(
        lex_escape(r"\12", true),
        LexErrorKind::MalformedOctalEscape,
        r"\12"
    );
}

#[test]
fn test_hex_escapes() {
    assert_ok!(lex_escape(r"\x41", false), Escaped::Byte(0x41));
    assert_ok!(lex_escape(r"\xfg", false), Escaped::Byte(0x0F), "g");
    assert_ok!(lex_escape(r"\x414", false), Escaped::Byte(0x41), "4");
    assert_err!(
        lex_escape(r"\xg", false),
        LexErrorKind::MalformedHexEscape,
        r"\x"
    );
}

#[test]
fn test_universal_character_names() {
    assert_ok!(lex_escape(r"\u0041", false), Escaped::Char('A'));
    assert_ok!(lex_escape(r"\u00e9", false), Escaped::Char('é'));
    assert_ok!(lex_escape(r"\U0001F600", false), Escaped::Char('😀'));
    assert_ok!(lex_escape(r"\u0024", false), Escaped::Char('$'));
    assert_err!(
        lex_escape(r"\uD800", false),
        LexErrorKind::InvalidUniversalCharacterName(r"\uD800".into()),
        r"\uD800"
    );
    assert_err!(
        lex_escape(r"\U00110000", false),
        LexErrorKind::InvalidUniversalCharacterName(r"\U00110000".into()),
        r"\U00110000"
    );
    assert_err!(
        lex_escape(r"\u0007", false),
        LexErrorKind::InvalidUniversalCharacterName(r"\u0007".into()),
        r"\u0007"
    );
    assert_err!(
        lex_escape(r"\u0085", false),
        LexErrorKind::InvalidUniversalCharacterName(r"\u0085".into()),
        r"\u0085"
    );
    assert_err!(
        lex_escape(r"\u41", false),
        LexErrorKind::MalformedUniversalCharacterName { expected: 4 },
        r"\u41"
    );
}

#[test]
fn test_char_constants() {
    assert_eq!(lex_char_constant("'a'"), Ok(0x61));
    assert_eq!(lex_char_constant(r"'\x41'"), Ok(0x41));
    assert_eq!(lex_char_constant(r"'\101'"), Ok(0x41));
    assert_eq!(lex_char_constant(r"'\''"), Ok(0x27));
    assert_eq!(lex_char_constant("'é'"), Ok(0xE9));
    assert_eq!(
        lex_char_constant("''"),
        Err((LexErrorKind::EmptyCharConstant, "''"))
    );
    assert_eq!(
        lex_char_constant("'ab'"),
        Err((LexErrorKind::CharConstantTooLong, "'ab'"))
    );
    assert_eq!(
        lex_char_constant(r"'\x41b'"),
        Err((LexErrorKind::CharConstantTooLong, r"'\x41b'"))
    );
    assert_eq!(
        lex_char_constant(r"'\12'"),
        Err((LexErrorKind::MalformedOctalEscape, r"\12"))
    );
    assert_eq!(
        lex_char_constant(r"'\400'"),
        Err((LexErrorKind::OctalEscapeOutOfRange, r"\400"))
    );
    assert_eq!(
        lex_char_constant("'\t'"),
        Err((LexErrorKind::NonPrintableCharConstant, "\t"))
    );
}
