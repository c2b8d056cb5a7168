//! # Certificate Extractor
//!
//! Reads the reported fields out of a DER encoded X.509 certificate.

use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

use certinfo_common::certificate::CertificateDetails;

use crate::error::ExtractError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Extracts the certificate details, counting days to expiry from now.
pub fn extract_details(der: &[u8]) -> Result<CertificateDetails, ExtractError> {
    extract_details_at(der, Utc::now())
}

/// Same as [`extract_details`] with an explicit reference time.
pub fn extract_details_at(der: &[u8], now: DateTime<Utc>) -> Result<CertificateDetails, ExtractError> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| ExtractError::Parse(e.to_string()))?;

    let common_name = common_name(&cert)?;
    let subject_alt_names = subject_alt_names(&cert)?;

    let not_before = to_datetime(cert.validity().not_before.timestamp())?;
    let not_after = to_datetime(cert.validity().not_after.timestamp())?;

    Ok(CertificateDetails {
        common_name,
        subject_alt_names,
        valid_from: not_before.format(TIMESTAMP_FORMAT).to_string(),
        valid_to: not_after.format(TIMESTAMP_FORMAT).to_string(),
        expire_in_days: days_until(not_after, now),
    })
}

/// First common name of the subject.
fn common_name(cert: &X509Certificate<'_>) -> Result<String, ExtractError> {
    let attr = cert
        .subject()
        .iter_common_name()
        .next()
        .ok_or(ExtractError::MissingCommonName)?;

    attr.as_str()
        .map(str::to_string)
        .map_err(|e| ExtractError::Parse(e.to_string()))
}

/// DNS names of the SAN extension joined with `;`. Other name types are skipped.
fn subject_alt_names(cert: &X509Certificate<'_>) -> Result<String, ExtractError> {
    let san = cert
        .subject_alternative_name()
        .map_err(|e| ExtractError::Parse(e.to_string()))?
        .ok_or(ExtractError::MissingSubjectAltName)?;

    let dns_names: Vec<&str> = san
        .value
        .general_names
        .iter()
        .filter_map(|name| match name {
            GeneralName::DNSName(dns) => Some(*dns),
            _ => None,
        })
        .collect();

    Ok(dns_names.join(";"))
}

/// Whole days from `now` to `until`, rounded down: twelve hours past expiry is day -1.
fn days_until(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (until - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

fn to_datetime(timestamp: i64) -> Result<DateTime<Utc>, ExtractError> {
    DateTime::from_timestamp(timestamp, 0).ok_or(ExtractError::InvalidValidity(timestamp))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
