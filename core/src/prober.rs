//! # Probe Orchestrator
//!
//! Runs a probe against every expanded target and collects the records of
//! those that succeeded.
//!
//! A failing target never aborts the run: its error is logged and the
//! target is left out of the results. Results keep the order of the input
//! list, whatever the number of probes in flight.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use certinfo_common::certificate::{CertificateInfo, ProbeResults};
use certinfo_common::config::ProbeConfig;
use certinfo_common::network::target::ProbeTargets;

use crate::error::ProbeError;
use crate::extractor;
use crate::fetcher::CertificateFetcher;

/// Progress notifications emitted while a run is going on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeProgress<'a> {
    Started { target: &'a str },
    Finished { target: &'a str, completed: usize, total: usize },
}

pub type ProgressCallback = Box<dyn Fn(ProbeProgress<'_>) + Send + Sync>;

/// Fetches and decodes the certificate of a single target.
pub async fn probe_target(
    fetcher: &dyn CertificateFetcher,
    target: &str,
    port: u16,
) -> Result<CertificateInfo, ProbeError> {
    info!(host = %target, "Trying to fetch certificate");
    let der = fetcher.fetch(target, port).await?;
    let details = extractor::extract_details(&der)?;
    Ok(CertificateInfo::new(details, target, port))
}

/// Probes every target and returns the successful records.
///
/// Targets are pulled from `targets` as workers free up, so huge networks
/// are never held in memory at once.
pub async fn perform_probe(
    targets: &ProbeTargets,
    config: &ProbeConfig,
    fetcher: &dyn CertificateFetcher,
    on_progress: Option<ProgressCallback>,
) -> ProbeResults {
    let total = usize::try_from(targets.len()).unwrap_or(usize::MAX);
    let workers = config.workers.max(1);
    let on_progress = on_progress.as_ref();
    let completed = AtomicUsize::new(0);

    let results: ProbeResults = stream::iter(targets.iter())
        .map(|target| {
            let completed = &completed;
            async move {
                if let Some(cb) = on_progress {
                    cb(ProbeProgress::Started { target: &target });
                }

                let outcome = match probe_target(fetcher, &target, config.port).await {
                    Ok(info) => Some(info),
                    Err(ProbeError::Fetch(e)) => {
                        info!(host = %target, "Could not fetch certificate: {e}");
                        None
                    }
                    Err(ProbeError::Extract(e)) => {
                        warn!(host = %target, "Could not read certificate: {e}");
                        None
                    }
                };

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(cb) = on_progress {
                    cb(ProbeProgress::Finished {
                        target: &target,
                        completed: done,
                        total,
                    });
                }
                outcome.map(|info| (target, info))
            }
        })
        .buffered(workers)
        .filter_map(future::ready)
        .collect()
        .await;

    info!("{} of {total} targets presented a certificate", results.len());
    results
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
