//! # IP Range Model
//!
//! Continuous, inclusive ranges of IPv4 or IPv6 addresses.
//!
//! Used by [`crate::network::target::Target`] to represent both explicit
//! ranges (`192.168.0.253 - 192.168.1.2`) and CIDR networks (`192.168.1.0/24`).
//! Addresses are handled as plain integers, so ranges freely cross octet
//! and subnet boundaries.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;

/// An inclusive range of addresses of a single family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpRange {
    start_addr: IpAddr,
    end_addr: IpAddr,
}

impl IpRange {
    /// Creates a range, or `None` when the two ends belong to different families.
    pub fn new(start_addr: IpAddr, end_addr: IpAddr) -> Option<Self> {
        if start_addr.is_ipv4() != end_addr.is_ipv4() {
            return None;
        }
        Some(Self {
            start_addr,
            end_addr,
        })
    }

    /// Parses `start - end` with optional whitespace around the dash.
    ///
    /// Only strictly increasing ranges are accepted: a range spanning a
    /// single address is just an address.
    pub fn parse(s: &str) -> Option<Self> {
        let (start_str, end_str) = s.split_once('-')?;
        let start_addr: IpAddr = start_str.trim().parse().ok()?;
        let end_addr: IpAddr = end_str.trim().parse().ok()?;

        let range = Self::new(start_addr, end_addr)?;
        (range.start() < range.end()).then_some(range)
    }

    /// The full address block of `network`, network and broadcast addresses included.
    pub fn from_network(network: IpNetwork) -> Self {
        match network {
            IpNetwork::V4(net) => {
                let (start, end) = block_bounds(u32::from(net.ip()) as u128, net.prefix(), 32);
                Self {
                    start_addr: IpAddr::V4(Ipv4Addr::from(start as u32)),
                    end_addr: IpAddr::V4(Ipv4Addr::from(end as u32)),
                }
            }
            IpNetwork::V6(net) => {
                let (start, end) = block_bounds(u128::from(net.ip()), net.prefix(), 128);
                Self {
                    start_addr: IpAddr::V6(Ipv6Addr::from(start)),
                    end_addr: IpAddr::V6(Ipv6Addr::from(end)),
                }
            }
        }
    }

    pub fn start_addr(&self) -> IpAddr {
        self.start_addr
    }

    pub fn end_addr(&self) -> IpAddr {
        self.end_addr
    }

    /// Number of addresses in the range, saturating for a whole IPv6 space.
    pub fn len(&self) -> u128 {
        if self.start() > self.end() {
            return 0;
        }
        (self.end() - self.start()).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every address from start to end, ascending.
    pub fn to_iter(&self) -> IpRangeIter {
        IpRangeIter {
            next: (self.start() <= self.end()).then_some(self.start()),
            end: self.end(),
            is_ipv4: self.start_addr.is_ipv4(),
        }
    }

    fn start(&self) -> u128 {
        to_u128(self.start_addr)
    }

    fn end(&self) -> u128 {
        to_u128(self.end_addr)
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_addr, self.end_addr)
    }
}

impl IntoIterator for &IpRange {
    type Item = IpAddr;
    type IntoIter = IpRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.to_iter()
    }
}

/// Lazy ascending iterator over an [`IpRange`].
#[derive(Debug, Clone)]
pub struct IpRangeIter {
    next: Option<u128>,
    end: u128,
    is_ipv4: bool,
}

impl Iterator for IpRangeIter {
    type Item = IpAddr;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = (current < self.end).then(|| current + 1);

        let addr = if self.is_ipv4 {
            IpAddr::V4(Ipv4Addr::from(current as u32))
        } else {
            IpAddr::V6(Ipv6Addr::from(current))
        };
        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(next) => {
                let remaining = (self.end - next)
                    .checked_add(1)
                    .and_then(|count| usize::try_from(count).ok());
                (remaining.unwrap_or(usize::MAX), remaining)
            }
            None => (0, Some(0)),
        }
    }
}

fn to_u128(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(ipv4_addr) => u32::from(ipv4_addr) as u128,
        IpAddr::V6(ipv6_addr) => u128::from(ipv6_addr),
    }
}

/// First and last address of the block containing `addr`.
fn block_bounds(addr: u128, prefix: u8, width: u8) -> (u128, u128) {
    let host_bits = u32::from(width.saturating_sub(prefix));
    let all_ones: u128 = if width == 128 { u128::MAX } else { (1u128 << width) - 1 };
    let host_mask: u128 = if host_bits >= 128 {
        u128::MAX
    } else {
        (1u128 << host_bits) - 1
    };

    let network = addr & all_ones & !host_mask;
    (network, network | (host_mask & all_ones))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
