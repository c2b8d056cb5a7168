//! # Probe Target Model
//!
//! Turns the host tokens given on the command line into a flat, ordered
//! sequence of endpoints to probe.
//!
//! A token can be:
//! * A hostname (e.g., `github.com`), probed as is.
//! * A single IPv4/IPv6 address (e.g., `192.168.1.5`), probed as is.
//! * An address range (e.g., `192.168.0.253 - 192.168.1.2`).
//! * A CIDR block (e.g., `192.168.1.0/24` or `192.168.1.0/255.255.255.0`).

use std::iter;
use std::str::FromStr;

use ipnetwork::IpNetwork;
use tracing::debug;

use crate::certificate::ProbeTarget;
use crate::error::ValidationError;
use crate::network::range::IpRange;
use crate::network::validate;

/// A single classified host token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A hostname or an IP literal, kept exactly as given.
    Host { name: String },
    /// An inclusive range of addresses.
    Range { ip_range: IpRange },
    /// Every address of a network block.
    Network { ip_network: IpNetwork },
}

impl FromStr for Target {
    type Err = ValidationError;

    /// Classifies a token. The first matching rule wins: hostname or address,
    /// then range, then network.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if validate::is_hostname(s) || validate::is_ip_address(s) {
            return Ok(Target::Host {
                name: s.to_string(),
            });
        }

        if let Some(ip_range) = IpRange::parse(s) {
            return Ok(Target::Range { ip_range });
        }

        if let Some(ip_network) = validate::parse_network(s) {
            return Ok(Target::Network { ip_network });
        }

        Err(ValidationError::InvalidTarget(s.to_string()))
    }
}

impl Target {
    /// Number of probe targets this token stands for, saturating for huge IPv6 blocks.
    pub fn count(&self) -> u128 {
        match self {
            Target::Host { .. } => 1,
            Target::Range { ip_range } => ip_range.len(),
            Target::Network { ip_network } => IpRange::from_network(*ip_network).len(),
        }
    }

    /// Every probe target this token stands for, in ascending address order.
    ///
    /// Addresses are produced on demand, so a `/64` costs nothing until iterated.
    pub fn expand(&self) -> Box<dyn Iterator<Item = ProbeTarget> + '_> {
        match self {
            Target::Host { name } => Box::new(iter::once(name.clone())),
            Target::Range { ip_range } => Box::new(ip_range.into_iter().map(|addr| addr.to_string())),
            Target::Network { ip_network } => Box::new(
                IpRange::from_network(*ip_network)
                    .to_iter()
                    .map(|addr| addr.to_string()),
            ),
        }
    }
}

/// The ordered probe targets of a run, expanded lazily from the host tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeTargets {
    tokens: Vec<Target>,
}

impl ProbeTargets {
    /// Total number of targets, saturating at `u128::MAX`.
    pub fn len(&self) -> u128 {
        self.tokens
            .iter()
            .map(Target::count)
            .fold(0, u128::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ProbeTarget> + '_ {
        self.tokens.iter().flat_map(Target::expand)
    }
}

/// Validates a single host token, as done for every command line argument.
pub fn check_target(s: &str) -> Result<String, ValidationError> {
    Target::from_str(s).map(|_| s.to_string())
}

/// Classifies raw host tokens into the ordered probe targets of a run.
///
/// Tokens that are neither a hostname, an address, a range nor a network
/// contribute nothing.
pub fn expand_targets<I, S>(tokens: I) -> ProbeTargets
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut targets = ProbeTargets::default();

    for token in tokens {
        let token = token.as_ref();
        match Target::from_str(token) {
            Ok(target) => {
                debug!("Host token '{token}' stands for {} targets", target.count());
                targets.tokens.push(target);
            }
            Err(e) => debug!("Skipping host token: {e}"),
        }
    }

    targets
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
