use std::{cmp::Ordering, net::IpAddr};

/// Strict version of PartialOrd that can define different enum items as
/// incomparable.
pub trait StrictPartialOrd<Rhs: ?Sized = Self>: PartialOrd<Rhs> {
    fn strict_partial_cmp(&self, other: &Rhs) -> Option<Ordering> {
        self.partial_cmp(other)
    }
}

impl StrictPartialOrd for IpAddr {
    fn strict_partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (IpAddr::V4(lhs), IpAddr::V4(rhs)) => Some(lhs.cmp(rhs)),
            (IpAddr::V6(lhs), IpAddr::V6(rhs)) => Some(lhs.cmp(rhs)),
            _ => None,
        }
    }
}

#[test]
fn test_ip_strict_partial_ord() {
    let ips = &[
        IpAddr::from([10, 0, 0, 0]),
        IpAddr::from([127, 0, 0, 1]),
        IpAddr::from([0, 0, 0, 0, 0, 0, 0, 1]),
        IpAddr::from([0, 0, 0, 0, 0, 0, 0, 2]),
    ];

    for lhs in ips {
        for rhs in ips {
            if lhs.is_ipv4() == rhs.is_ipv4() {
                assert_eq!(lhs.strict_partial_cmp(rhs), lhs.partial_cmp(rhs));
            } else {
                assert_eq!(lhs.strict_partial_cmp(rhs), None);
            }
        }
    }
}
