//! Certificate probing: fetching peer certificates over TLS, reading their
//! metadata and rendering the collected results.

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod prober;
pub mod report;
