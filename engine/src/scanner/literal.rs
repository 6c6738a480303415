//! Recognizers for the literal shapes of the default mode.
//!
//! Each recognizer returns the length of the longest prefix of its input it
//! accepts, or `None`. Picking between overlapping shapes is left to the
//! scanner.

use crate::lex::count_while;
use std::{net::Ipv6Addr, str::FromStr};

fn hex_digits(input: &str, n: usize) -> bool {
    count_while(input, n, |c| c.is_ascii_hexdigit()) == n
}

fn dec_digits(input: &str, max: usize) -> usize {
    count_while(input, max, |c| c.is_ascii_digit())
}

/// `sep hex{width}` repeated `count` times after a leading `hex{width}`.
fn separated_groups(input: &str, sep: char, width: usize, count: usize) -> Option<usize> {
    if !hex_digits(input, width) {
        return None;
    }
    let mut len = width;
    for _ in 0..count {
        let rest = input[len..].strip_prefix(sep)?;
        if !hex_digits(rest, width) {
            return None;
        }
        len += sep.len_utf8() + width;
    }
    Some(len)
}

/// Optional `/` followed by up to `max` decimal digits.
fn prefix_len(input: &str, max: usize) -> usize {
    match input.strip_prefix('/') {
        Some(rest) => match dec_digits(rest, max) {
            0 => 0,
            n => 1 + n,
        },
        None => 0,
    }
}

/// `aa:bb:cc:dd:ee:ff`, `aa-bb-...`, `aa.bb....` or `aabb.ccdd.eeff`.
pub fn ether(input: &str) -> Option<usize> {
    [':', '-', '.']
        .iter()
        .filter_map(|&sep| separated_groups(input, sep, 2, 5))
        .chain(separated_groups(input, '.', 4, 2))
        .max()
}

/// `a.b.c.d` with one to three digits per octet, and an optional prefix
/// length of up to two digits.
pub fn ipv4(input: &str) -> Option<usize> {
    let mut len = 0;
    for i in 0..4 {
        if i > 0 {
            if !input[len..].starts_with('.') {
                return None;
            }
            len += 1;
        }
        match dec_digits(&input[len..], 3) {
            0 => return None,
            n => len += n,
        }
    }
    Some(len + prefix_len(&input[len..], 2))
}

/// The longest prefix that is a valid IPv6 address, with an optional prefix
/// length of up to three digits.
pub fn ipv6(input: &str) -> Option<usize> {
    let run = count_while(input, usize::MAX, |c| {
        c.is_ascii_hexdigit() || c == ':' || c == '.'
    });
    let len = (2..=run)
        .rev()
        .find(|&len| input[..len].contains(':') && Ipv6Addr::from_str(&input[..len]).is_ok())?;
    Some(len + prefix_len(&input[len..], 3))
}

/// `aa:` or `aa:bb(:cc)*`, optionally preceded by a colon.
pub fn colon_bytes(input: &str) -> Option<usize> {
    let lead = usize::from(input.starts_with(':'));
    let body = &input[lead..];
    if !hex_digits(body, 2) {
        return None;
    }
    let mut len = 2;
    while let Some(rest) = body[len..].strip_prefix(':') {
        if !hex_digits(rest, 2) {
            break;
        }
        len += 3;
    }
    if len == 2 {
        if body[len..].starts_with(':') {
            len += 1;
        } else {
            return None;
        }
    }
    Some(lead + len)
}

/// `aa-bb(-cc)*` or `aa.bb(.cc)*`.
pub fn separated_bytes(input: &str, sep: char) -> Option<usize> {
    let mut len = separated_groups(input, sep, 2, 1)?;
    while let Some(rest) = input[len..].strip_prefix(sep) {
        if !hex_digits(rest, 2) {
            break;
        }
        len += 1 + 2;
    }
    Some(len)
}

/// `:` followed by a run of hex digits.
pub fn hex_run(input: &str) -> Option<usize> {
    let rest = input.strip_prefix(':')?;
    match count_while(rest, usize::MAX, |c| c.is_ascii_hexdigit()) {
        0 => None,
        n => Some(1 + n),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// A protocol or field name, number or other word, optionally preceded by a
/// dot: `.?[A-Za-z0-9_][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)*`.
pub fn identifier(input: &str) -> Option<usize> {
    let lead = usize::from(input.starts_with('.'));
    let body = &input[lead..];
    if !body.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let mut len = count_while(body, usize::MAX, is_word_char);
    while let Some(rest) = body[len..].strip_prefix('.') {
        match count_while(rest, usize::MAX, is_word_char) {
            0 => break,
            n => len += 1 + n,
        }
    }
    Some(lead + len)
}

#[test]
fn test_ether() {
    assert_eq!(ether("00:11:22:33:44:55 "), Some(17));
    assert_eq!(ether("00-11-22-33-44-55"), Some(17));
    assert_eq!(ether("00.11.22.33.44.55"), Some(17));
    assert_eq!(ether("0011.2233.4455"), Some(14));
    assert_eq!(ether("00:11:22:33:44"), None);
    assert_eq!(ether("00:11-22:33:44:55"), None);
}

#[test]
fn test_ipv4() {
    assert_eq!(ipv4("192.168.0.1"), Some(11));
    assert_eq!(ipv4("10.0.0.0/8 "), Some(10));
    assert_eq!(ipv4("10.0.0.0/"), Some(8));
    assert_eq!(ipv4("10.0.0"), None);
    assert_eq!(ipv4("1.2.3.4..1.2.3.5"), Some(7));
}

#[test]
fn test_ipv6() {
    assert_eq!(ipv6("::1"), Some(3));
    assert_eq!(ipv6("fe80::1/64)"), Some(10));
    assert_eq!(ipv6("::ffff:1.2.3.4 "), Some(14));
    assert_eq!(ipv6("2001:db8::"), Some(10));
    assert_eq!(ipv6("aa:bb"), None);
    assert_eq!(ipv6("1.2.3.4"), None);
}

#[test]
fn test_bytes() {
    assert_eq!(colon_bytes("aa:bb:cc"), Some(8));
    assert_eq!(colon_bytes(":aa:bb"), Some(6));
    assert_eq!(colon_bytes("aa: "), Some(3));
    assert_eq!(colon_bytes("aa:bb:c"), Some(5));
    assert_eq!(colon_bytes("aa"), None);
    assert_eq!(separated_bytes("aa-bb-cc", '-'), Some(8));
    assert_eq!(separated_bytes("aa.bb.cc", '.'), Some(8));
    assert_eq!(separated_bytes("aa.b", '.'), None);
    assert_eq!(hex_run(":aabbcc"), Some(7));
    assert_eq!(hex_run(":"), None);
}

#[test]
fn test_identifier() {
    assert_eq!(identifier("tcp.port=="), Some(8));
    assert_eq!(identifier(".tcp.port"), Some(9));
    assert_eq!(identifier("ip-1.x_y "), Some(8));
    assert_eq!(identifier("1..2"), Some(1));
    assert_eq!(identifier("..2"), None);
    assert_eq!(identifier("-1"), None);
    assert_eq!(identifier("tcp."), Some(3));
}
