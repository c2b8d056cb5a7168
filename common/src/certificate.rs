//! # Certificate Records
//!
//! The flat metadata reported for every successfully probed target, and the
//! insertion ordered collection of those records.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A connectable endpoint: a hostname or an IP literal.
pub type ProbeTarget = String;

/// Column order used by every tabular output format.
pub const COLUMNS: [&str; 8] = [
    "peer",
    "CN",
    "SAN",
    "valid_from",
    "valid_to",
    "expire_in_days",
    "peername",
    "peerport",
];

/// What can be read from the certificate alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDetails {
    pub common_name: String,
    /// DNS names of the subject alternative name extension, `;` separated.
    pub subject_alt_names: String,
    pub valid_from: String,
    pub valid_to: String,
    /// Whole days until `valid_to`, negative once expired.
    pub expire_in_days: i64,
}

/// Certificate metadata of one probed peer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CertificateInfo {
    #[serde(rename = "CN")]
    pub common_name: String,
    #[serde(rename = "SAN")]
    pub subject_alt_names: String,
    pub valid_from: String,
    pub valid_to: String,
    pub expire_in_days: i64,
    pub peername: String,
    pub peerport: u16,
}

impl CertificateInfo {
    pub fn new(details: CertificateDetails, peername: impl Into<String>, peerport: u16) -> Self {
        Self {
            common_name: details.common_name,
            subject_alt_names: details.subject_alt_names,
            valid_from: details.valid_from,
            valid_to: details.valid_to,
            expire_in_days: details.expire_in_days,
            peername: peername.into(),
            peerport,
        }
    }

    /// The row of this record under [`COLUMNS`], without the leading `peer` cell.
    pub fn to_row(&self) -> [String; 7] {
        [
            self.common_name.clone(),
            self.subject_alt_names.clone(),
            self.valid_from.clone(),
            self.valid_to.clone(),
            self.expire_in_days.to_string(),
            self.peername.clone(),
            self.peerport.to_string(),
        ]
    }
}

/// Successful probes keyed by target, in insertion order.
///
/// Failed targets are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeResults {
    entries: Vec<(ProbeTarget, CertificateInfo)>,
    index: HashMap<ProbeTarget, usize>,
}

impl ProbeResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record. A target seen before keeps its position and gets the new record.
    pub fn insert(&mut self, target: ProbeTarget, info: CertificateInfo) {
        match self.index.get(&target) {
            Some(&pos) => self.entries[pos].1 = info,
            None => {
                self.index.insert(target.clone(), self.entries.len());
                self.entries.push((target, info));
            }
        }
    }

    pub fn get(&self, target: &str) -> Option<&CertificateInfo> {
        self.index.get(target).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.index.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProbeTarget, &CertificateInfo)> {
        self.entries.iter().map(|(target, info)| (target, info))
    }

    pub fn targets(&self) -> impl Iterator<Item = &ProbeTarget> {
        self.entries.iter().map(|(target, _)| target)
    }
}

impl FromIterator<(ProbeTarget, CertificateInfo)> for ProbeResults {
    fn from_iter<T: IntoIterator<Item = (ProbeTarget, CertificateInfo)>>(iter: T) -> Self {
        let mut results = ProbeResults::new();
        for (target, info) in iter {
            results.insert(target, info);
        }
        results
    }
}

impl Extend<(ProbeTarget, CertificateInfo)> for ProbeResults {
    fn extend<T: IntoIterator<Item = (ProbeTarget, CertificateInfo)>>(&mut self, iter: T) {
        for (target, info) in iter {
            self.insert(target, info);
        }
    }
}

impl Serialize for ProbeResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (target, info) in &self.entries {
            map.serialize_entry(target, info)?;
        }
        map.end()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
