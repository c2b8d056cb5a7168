//! # Target Validation
//!
//! Pure predicates classifying a single host token as a hostname, an IP
//! address, a CIDR network or an IP range.
//!
//! All predicates are total: any string input yields `true` or `false`,
//! never an error or a panic.

use std::net::{IpAddr, Ipv4Addr};

use ipnetwork::IpNetwork;

use crate::network::range::IpRange;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Returns `true` if `s` is a fully qualified domain name as defined in RFC-1035.
///
/// One trailing dot is tolerated. The rightmost label must not be all-numeric,
/// so dotted-quad strings such as `10.0.0.1` are never mistaken for hostnames.
pub fn is_hostname(s: &str) -> bool {
    let name = s.strip_suffix('.').unwrap_or(s);
    if name.len() > MAX_HOSTNAME_LEN {
        return false;
    }

    let tld = name.rsplit('.').next().unwrap_or(name);
    if !tld.is_empty() && tld.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    name.split('.').all(is_label)
}

/// A label is 1-63 alphanumerics or hyphens, starting and ending alphanumeric.
fn is_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    bytes.len() <= MAX_LABEL_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

/// Returns `true` for an IPv4 or IPv6 literal.
pub fn is_ip_address(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok()
}

/// Returns `true` for CIDR notation whose prefix is shorter than the
/// address width. A `/32` or `/128` is a single host, not a network.
pub fn is_ip_network(s: &str) -> bool {
    parse_network(s).is_some()
}

/// Returns `true` for `start - end` where both ends are addresses of the
/// same family and `start < end`.
pub fn is_ip_range(s: &str) -> bool {
    IpRange::parse(s).is_some()
}

/// Parses an expandable network. Accepts both `addr/prefix` and
/// `addr/netmask`; host bits in `addr` are ignored.
pub fn parse_network(s: &str) -> Option<IpNetwork> {
    let (addr_str, prefix_str) = s.split_once('/')?;
    let addr: IpAddr = addr_str.parse().ok()?;
    let prefix: u8 = parse_prefix(prefix_str, &addr)?;

    let network = IpNetwork::new(addr, prefix).ok()?;
    let width: u8 = match network {
        IpNetwork::V4(_) => 32,
        IpNetwork::V6(_) => 128,
    };

    (network.prefix() < width).then_some(network)
}

/// Prefix length from either a decimal length or, for IPv4, a dotted netmask.
fn parse_prefix(prefix_str: &str, addr: &IpAddr) -> Option<u8> {
    if !prefix_str.is_empty() && prefix_str.bytes().all(|b| b.is_ascii_digit()) {
        return prefix_str.parse().ok();
    }

    let IpAddr::V4(_) = addr else {
        return None;
    };
    let mask: u32 = prefix_str.parse::<Ipv4Addr>().ok()?.into();
    let ones = mask.leading_ones();
    // 255.0.255.0 and friends are not netmasks
    (mask.count_ones() == ones).then_some(ones as u8)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
