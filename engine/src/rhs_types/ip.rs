use crate::lex::{LexError, LexErrorKind};
use cidr::{errors::NetworkParseError, IpCidr, IpInet};
use serde::{Serialize, Serializer};
use std::{
    fmt::{self, Debug, Display, Formatter},
    net::IpAddr,
    str::FromStr,
};

/// An IPv4 or IPv6 address literal with an optional prefix length.
///
/// With a prefix the literal stands for the network containing the address,
/// host bits included: `10.1.2.3/8` and `10.0.0.0/8` are the same network.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct IpLiteral {
    addr: IpAddr,
    network: Option<IpCidr>,
}

impl IpLiteral {
    /// The address as written.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The prefix length, if one was given.
    pub fn prefix(&self) -> Option<u8> {
        self.network.map(|network| network.network_length())
    }

    /// Whether `addr` equals the address, or falls within the network when a
    /// prefix was given.
    pub fn matches(&self, addr: &IpAddr) -> bool {
        match &self.network {
            Some(network) => network.contains(addr),
            None => self.addr == *addr,
        }
    }
}

impl Display for IpLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.prefix() {
            Some(len) => write!(f, "{}/{}", self.addr, len),
            None => write!(f, "{}", self.addr),
        }
    }
}

impl Debug for IpLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Serialize for IpLiteral {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(self)
    }
}

/// Parses `addr` or `addr/len`. The prefix must not exceed 32 for IPv4 or 128
/// for IPv6.
pub(crate) fn parse_ip(input: &str) -> Result<IpLiteral, LexError<'_>> {
    let (addr_text, prefix_text) = match input.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (input, None),
    };

    let addr = IpAddr::from_str(addr_text).map_err(|err| {
        (
            LexErrorKind::ParseNetwork(NetworkParseError::AddrParseError(err)),
            addr_text,
        )
    })?;

    let network = match prefix_text {
        Some(prefix_text) => {
            let len = u8::from_str(prefix_text).map_err(|err| {
                (
                    LexErrorKind::ParseNetwork(NetworkParseError::NetworkLengthParseError(err)),
                    prefix_text,
                )
            })?;
            let inet = IpInet::new(addr, len).map_err(|err| {
                (
                    LexErrorKind::ParseNetwork(NetworkParseError::NetworkLengthTooLongError(err)),
                    input,
                )
            })?;
            Some(inet.network())
        }
        None => None,
    };

    Ok(IpLiteral { addr, network })
}

#[test]
fn test_parse() {
    let ip = parse_ip("12.34.56.78").unwrap();
    assert_eq!(ip.addr(), IpAddr::from([12, 34, 56, 78]));
    assert_eq!(ip.prefix(), None);
    assert!(ip.matches(&IpAddr::from([12, 34, 56, 78])));
    assert!(!ip.matches(&IpAddr::from([12, 34, 56, 79])));

    let net = parse_ip("12.34.56.78/24").unwrap();
    assert_eq!(net.prefix(), Some(24));
    assert_eq!(net.to_string(), "12.34.56.78/24");
    assert!(net.matches(&IpAddr::from([12, 34, 56, 1])));
    assert!(!net.matches(&IpAddr::from([12, 34, 57, 1])));

    let v6 = parse_ip("fe80::/10").unwrap();
    assert!(v6.matches(&IpAddr::from([0xfe80, 0, 0, 0, 0, 0, 0, 1])));
    assert!(!v6.matches(&IpAddr::from([10, 0, 0, 1])));

    assert_eq!(
        parse_ip("::ffff:1.2.3.4").unwrap().addr(),
        IpAddr::from([0, 0, 0, 0, 0, 0xffff, 0x0102, 0x0304])
    );
}

#[test]
fn test_errors() {
    match parse_ip("10.0.0.0/33") {
        Err((
            LexErrorKind::ParseNetwork(NetworkParseError::NetworkLengthTooLongError(_)),
            "10.0.0.0/33",
        )) => {}
        err => panic!("Expected NetworkLengthTooLongError, got {:?}", err),
    }
    match parse_ip("::1/129") {
        Err((
            LexErrorKind::ParseNetwork(NetworkParseError::NetworkLengthTooLongError(_)),
            "::1/129",
        )) => {}
        err => panic!("Expected NetworkLengthTooLongError, got {:?}", err),
    }
    assert_err!(
        parse_ip("::1/999"),
        LexErrorKind::ParseNetwork(NetworkParseError::NetworkLengthParseError(
            u8::from_str("999").unwrap_err()
        )),
        "999"
    );
    assert_err!(
        parse_ip("10.0.0.256"),
        LexErrorKind::ParseNetwork(NetworkParseError::AddrParseError(
            IpAddr::from_str("10.0.0.256").unwrap_err()
        )),
        "10.0.0.256"
    );
}
