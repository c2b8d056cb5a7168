//! # certinfo-common
//!
//! Domain layer shared by the probing engine and the command line front end.
//!
//! * **[`network`]**: classifying and expanding host tokens, IP ranges and proxy settings.
//! * **[`certificate`]**: the per-target certificate record and the aggregated result set.
//! * **[`config`]**: run configuration handed from the CLI to the engine.
//! * **[`error`]**: validation errors raised before any network activity.
//!
//! Nothing in this crate performs I/O.

pub mod certificate;
pub mod config;
pub mod error;
pub mod network;
