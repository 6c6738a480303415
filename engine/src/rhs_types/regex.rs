use crate::ast::parse::ParserSettings;
use serde::{Serialize, Serializer};
use std::{
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
};

pub use regex::Error;

/// A compiled `matches` pattern.
///
/// Patterns are compiled without Unicode support so they match raw packet
/// bytes.
#[derive(Clone)]
pub struct Regex(regex::bytes::Regex);

impl Regex {
    /// Compiles a pattern honouring the size limits of the parser settings.
    ///
    /// Bytes that aren't valid UTF-8 are matched literally.
    pub fn new(pattern: &[u8], settings: &ParserSettings) -> Result<Self, Error> {
        let pattern = match std::str::from_utf8(pattern) {
            Ok(pattern) => pattern.to_owned(),
            Err(_) => pattern
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        char::from(b).to_string()
                    } else {
                        format!(r"\x{:02X}", b)
                    }
                })
                .collect(),
        };
        regex::bytes::RegexBuilder::new(&pattern)
            .unicode(false)
            .size_limit(settings.regex_compiled_size_limit)
            .dfa_size_limit(settings.regex_dfa_size_limit)
            .build()
            .map(Regex)
    }

    /// Returns true if and only if the regex matches the bytes given.
    pub fn is_match(&self, text: &[u8]) -> bool {
        self.0.is_match(text)
    }

    /// Returns the source pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Regex {
    fn eq(&self, other: &Regex) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Regex {}

impl Hash for Regex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl Debug for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Regex {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(ser)
    }
}

#[test]
fn test() {
    let settings = ParserSettings::default();
    let regex = Regex::new(br"^a.c\d$", &settings).unwrap();
    assert!(regex.is_match(b"abc1"));
    assert!(regex.is_match(b"a\xFFc1"));
    assert!(!regex.is_match(b"abc"));
    assert_eq!(
        serde_json::to_value(&regex).unwrap(),
        serde_json::json!(r"^a.c\d$")
    );

    let binary = Regex::new(b"\xFF+", &settings).unwrap();
    assert!(binary.is_match(b"\xFF\xFF"));
    assert_eq!(binary.as_str(), r"\xFF+");

    assert!(Regex::new(b"(", &settings).is_err());

    let tiny = ParserSettings {
        regex_compiled_size_limit: 16,
        ..ParserSettings::default()
    };
    assert!(Regex::new(br"\w{100}", &tiny).is_err());
}
