use crate::lex::{LexError, LexErrorKind};
use ordered_float::OrderedFloat;
use std::str::FromStr;

/// Parses a decimal floating point number such as `1.5` or `2e-3`.
///
/// Only numbers starting with a digit are accepted so that words like `inf`
/// and `nan` stay available as field names.
pub(crate) fn parse_float(input: &str) -> Result<OrderedFloat<f64>, LexError<'_>> {
    if !input.starts_with(|c: char| c.is_ascii_digit()) {
        return Err((LexErrorKind::ExpectedName("number"), input));
    }
    f64::from_str(input)
        .map(OrderedFloat)
        .map_err(|err| (LexErrorKind::ParseFloat(err), input))
}

#[test]
fn test() {
    assert_eq!(parse_float("0.0"), Ok(OrderedFloat(0.0)));
    assert_eq!(parse_float("1.5"), Ok(OrderedFloat(1.5)));
    assert_eq!(parse_float("2e-3"), Ok(OrderedFloat(0.002)));
    assert_eq!(
        parse_float("nan"),
        Err((LexErrorKind::ExpectedName("number"), "nan"))
    );
    assert!(parse_float("1.2.3").is_err());
}
