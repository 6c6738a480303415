use crate::lex::{LexError, LexErrorKind};

fn number(digits: &str, radix: u32) -> Result<i64, LexError<'_>> {
    i64::from_str_radix(digits, radix).map_err(|err| (LexErrorKind::ParseInt { err, radix }, digits))
}

/// Parses an integer in decimal, `0x` hexadecimal, `0b` binary or
/// leading-zero octal notation.
pub(crate) fn parse_int(input: &str) -> Result<i64, LexError<'_>> {
    if let Some(digits) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        number(digits, 16)
    } else if let Some(digits) = input.strip_prefix("0b").or_else(|| input.strip_prefix("0B")) {
        number(digits, 2)
    } else if input.len() > 1 && input.starts_with('0') {
        number(&input[1..], 8)
    } else {
        number(input, 10)
    }
}

#[test]
fn test() {
    assert_eq!(parse_int("0"), Ok(0));
    assert_eq!(parse_int("78"), Ok(78));
    assert_eq!(parse_int("0x1f5"), Ok(501));
    assert_eq!(parse_int("0123"), Ok(83));
    assert_eq!(parse_int("0b101"), Ok(5));
    assert_eq!(
        parse_int("0xefg"),
        Err((
            LexErrorKind::ParseInt {
                err: i64::from_str_radix("efg", 16).unwrap_err(),
                radix: 16,
            },
            "efg"
        ))
    );
    assert!(parse_int("089").is_err());
    assert!(parse_int("tcp").is_err());
}
