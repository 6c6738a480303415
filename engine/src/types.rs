use crate::strict_partial_ord::StrictPartialOrd;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt::{self, Debug, Formatter},
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};
use thiserror::Error;

/// An error that occurs on a type mismatch.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("expected value of type {expected:?}, but got {actual:?}")]
pub struct TypeMismatchError {
    /// Expected value type.
    pub expected: Type,
    /// Provided value type.
    pub actual: Type,
}

/// Enumeration of supported types for field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A protocol; its value is the raw bytes it was dissected from.
    Protocol,
    /// A boolean flag.
    Bool,
    /// A signed or unsigned integer.
    Int,
    /// A floating point number.
    Float,
    /// A byte or text string.
    Bytes,
    /// An IPv4 or IPv6 address.
    Ip,
    /// A 6-byte hardware address.
    Ether,
}

impl Type {
    /// Returns whether a value of type `actual` may be stored in a field of
    /// this type.
    pub fn accepts(self, actual: Type) -> bool {
        self == actual || (self == Type::Protocol && actual == Type::Bytes)
    }
}

/// Provides a way to get a [`Type`] of the implementor.
pub trait GetType {
    /// Returns a type.
    fn get_type(&self) -> Type;
}

impl GetType for Type {
    fn get_type(&self) -> Type {
        *self
    }
}

/// A value of a dissected field.
///
/// These are passed to the [execution context](crate::ExecutionContext) and
/// are also produced while evaluating arithmetic and slices.
#[derive(PartialEq, Clone)]
pub enum LhsValue<'a> {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A byte string.
    Bytes(Cow<'a, [u8]>),
    /// An IPv4 or IPv6 address.
    Ip(IpAddr),
    /// A hardware address.
    Ether([u8; 6]),
}

impl Debug for LhsValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LhsValue::Bool(b) => Debug::fmt(b, f),
            LhsValue::Int(i) => Debug::fmt(i, f),
            LhsValue::Float(x) => Debug::fmt(x, f),
            LhsValue::Bytes(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i != 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            LhsValue::Ip(addr) => Debug::fmt(addr, f),
            LhsValue::Ether(mac) => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
            ),
        }
    }
}

impl GetType for LhsValue<'_> {
    fn get_type(&self) -> Type {
        match self {
            LhsValue::Bool(_) => Type::Bool,
            LhsValue::Int(_) => Type::Int,
            LhsValue::Float(_) => Type::Float,
            LhsValue::Bytes(_) => Type::Bytes,
            LhsValue::Ip(_) => Type::Ip,
            LhsValue::Ether(_) => Type::Ether,
        }
    }
}

impl<'a> LhsValue<'a> {
    /// Returns the raw bytes of values that have a byte representation.
    pub fn as_bytes(&self) -> Option<Cow<'_, [u8]>> {
        match self {
            LhsValue::Bytes(bytes) => Some(Cow::Borrowed(bytes)),
            LhsValue::Ether(mac) => Some(Cow::Borrowed(&mac[..])),
            LhsValue::Ip(IpAddr::V4(addr)) => Some(Cow::Owned(addr.octets().to_vec())),
            LhsValue::Ip(IpAddr::V6(addr)) => Some(Cow::Owned(addr.octets().to_vec())),
            _ => None,
        }
    }

    /// Returns whether the value counts as "set" in a bare test.
    pub fn is_truthy(&self) -> bool {
        match self {
            LhsValue::Bool(b) => *b,
            LhsValue::Int(i) => *i != 0,
            LhsValue::Float(x) => *x != 0.0,
            LhsValue::Bytes(bytes) => bytes.iter().any(|&b| b != 0),
            LhsValue::Ip(_) | LhsValue::Ether(_) => true,
        }
    }

    /// Borrows the value without copying its bytes.
    pub fn as_ref(&self) -> LhsValue<'_> {
        match self {
            LhsValue::Bytes(bytes) => LhsValue::Bytes(Cow::Borrowed(bytes)),
            LhsValue::Bool(b) => LhsValue::Bool(*b),
            LhsValue::Int(i) => LhsValue::Int(*i),
            LhsValue::Float(x) => LhsValue::Float(*x),
            LhsValue::Ip(addr) => LhsValue::Ip(*addr),
            LhsValue::Ether(mac) => LhsValue::Ether(*mac),
        }
    }

    /// Converts into an owned value with a `'static` lifetime.
    pub fn into_owned(self) -> LhsValue<'static> {
        match self {
            LhsValue::Bytes(bytes) => LhsValue::Bytes(Cow::Owned(bytes.into_owned())),
            LhsValue::Bool(b) => LhsValue::Bool(b),
            LhsValue::Int(i) => LhsValue::Int(i),
            LhsValue::Float(x) => LhsValue::Float(x),
            LhsValue::Ip(addr) => LhsValue::Ip(addr),
            LhsValue::Ether(mac) => LhsValue::Ether(mac),
        }
    }
}

impl PartialOrd for LhsValue<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (LhsValue::Bool(lhs), LhsValue::Bool(rhs)) => lhs.partial_cmp(rhs),
            (LhsValue::Int(lhs), LhsValue::Int(rhs)) => lhs.partial_cmp(rhs),
            (LhsValue::Float(lhs), LhsValue::Float(rhs)) => lhs.partial_cmp(rhs),
            (LhsValue::Bytes(lhs), LhsValue::Bytes(rhs)) => lhs.partial_cmp(rhs),
            (LhsValue::Ether(lhs), LhsValue::Ether(rhs)) => lhs.partial_cmp(rhs),
            (LhsValue::Ip(lhs), LhsValue::Ip(rhs)) => lhs.strict_partial_cmp(rhs),
            _ => None,
        }
    }
}

/// Comparison across value kinds, converting literals the way a filter author
/// expects: integers against floats, booleans against 0/1, hardware
/// addresses against 6-byte strings.
impl StrictPartialOrd for LhsValue<'_> {
    fn strict_partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (LhsValue::Int(lhs), LhsValue::Float(rhs)) => (*lhs as f64).partial_cmp(rhs),
            (LhsValue::Float(lhs), LhsValue::Int(rhs)) => lhs.partial_cmp(&(*rhs as f64)),
            (LhsValue::Bool(lhs), LhsValue::Int(rhs)) => i64::from(*lhs).partial_cmp(rhs),
            (LhsValue::Int(lhs), LhsValue::Bool(rhs)) => lhs.partial_cmp(&i64::from(*rhs)),
            (LhsValue::Ether(lhs), LhsValue::Bytes(rhs)) if rhs.len() == lhs.len() => {
                lhs[..].partial_cmp(&rhs[..])
            }
            (LhsValue::Bytes(lhs), LhsValue::Ether(rhs)) if lhs.len() == rhs.len() => {
                lhs[..].partial_cmp(&rhs[..])
            }
            (LhsValue::Bytes(lhs), LhsValue::Int(rhs)) if lhs.len() == 1 => {
                i64::from(lhs[0]).partial_cmp(rhs)
            }
            (LhsValue::Int(lhs), LhsValue::Bytes(rhs)) if rhs.len() == 1 => {
                lhs.partial_cmp(&i64::from(rhs[0]))
            }
            _ => self.partial_cmp(other),
        }
    }
}

impl From<bool> for LhsValue<'_> {
    fn from(b: bool) -> Self {
        LhsValue::Bool(b)
    }
}

macro_rules! impl_int_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for LhsValue<'_> {
            fn from(i: $ty) -> Self {
                LhsValue::Int(i64::from(i))
            }
        })*
    };
}

impl_int_from!(u8, u16, u32, i8, i16, i32, i64);

impl From<f64> for LhsValue<'_> {
    fn from(x: f64) -> Self {
        LhsValue::Float(x)
    }
}

impl<'a> From<&'a [u8]> for LhsValue<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        LhsValue::Bytes(Cow::Borrowed(bytes))
    }
}

impl<'a> From<&'a str> for LhsValue<'a> {
    fn from(s: &'a str) -> Self {
        LhsValue::Bytes(Cow::Borrowed(s.as_bytes()))
    }
}

impl From<Vec<u8>> for LhsValue<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        LhsValue::Bytes(Cow::Owned(bytes))
    }
}

impl From<String> for LhsValue<'_> {
    fn from(s: String) -> Self {
        LhsValue::Bytes(Cow::Owned(s.into_bytes()))
    }
}

impl From<IpAddr> for LhsValue<'_> {
    fn from(addr: IpAddr) -> Self {
        LhsValue::Ip(addr)
    }
}

impl From<Ipv4Addr> for LhsValue<'_> {
    fn from(addr: Ipv4Addr) -> Self {
        LhsValue::Ip(addr.into())
    }
}

impl From<Ipv6Addr> for LhsValue<'_> {
    fn from(addr: Ipv6Addr) -> Self {
        LhsValue::Ip(addr.into())
    }
}

impl From<[u8; 6]> for LhsValue<'_> {
    fn from(mac: [u8; 6]) -> Self {
        LhsValue::Ether(mac)
    }
}

#[test]
fn test_strict_partial_cmp() {
    assert_eq!(
        LhsValue::Int(3).strict_partial_cmp(&LhsValue::Float(2.5)),
        Some(Ordering::Greater)
    );
    assert_eq!(
        LhsValue::Bool(true).strict_partial_cmp(&LhsValue::Int(1)),
        Some(Ordering::Equal)
    );
    assert_eq!(
        LhsValue::Ether([1, 2, 3, 4, 5, 6])
            .strict_partial_cmp(&LhsValue::from(vec![1, 2, 3, 4, 5, 6])),
        Some(Ordering::Equal)
    );
    assert_eq!(
        LhsValue::Ip(IpAddr::from([10, 0, 0, 1]))
            .strict_partial_cmp(&LhsValue::Ip(IpAddr::from([0, 0, 0, 0, 0, 0, 0, 1]))),
        None
    );
    assert_eq!(
        LhsValue::from("abc").strict_partial_cmp(&LhsValue::Int(1)),
        None
    );
    assert_eq!(
        LhsValue::from(vec![0x10]).strict_partial_cmp(&LhsValue::Int(16)),
        Some(Ordering::Equal)
    );
    assert_eq!(
        LhsValue::Int(255).strict_partial_cmp(&LhsValue::from(vec![0xff])),
        Some(Ordering::Equal)
    );
    assert_eq!(
        LhsValue::Int(1).strict_partial_cmp(&LhsValue::from(vec![0x01, 0x02])),
        None
    );
}

#[test]
fn test_type_accepts() {
    assert!(Type::Protocol.accepts(Type::Bytes));
    assert!(Type::Int.accepts(Type::Int));
    assert!(!Type::Bytes.accepts(Type::Int));
}
