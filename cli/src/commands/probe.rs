use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info};

use certinfo_common::config::ProbeConfig;
use certinfo_common::network::proxy::resolve_proxy;
use certinfo_common::network::target::expand_targets;
use certinfo_core::fetcher::TlsFetcher;
use certinfo_core::prober::{self, ProbeProgress, ProgressCallback};
use certinfo_core::report;

use crate::commands::CommandLine;
use crate::terminal::progress;

pub async fn probe(cmd: &CommandLine) -> anyhow::Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let proxy = resolve_proxy(cmd.proxy.as_deref(), &env)?;

    let cfg = ProbeConfig {
        port: cmd.port,
        timeout: cmd.timeout(),
        proxy,
        workers: usize::try_from(cmd.workers).unwrap_or(usize::MAX),
    };
    debug!("Probe configuration: {cfg:?}");

    let targets = expand_targets(&cmd.hosts);
    info!("Probing {} targets on port {}", targets.len(), cfg.port);

    let fetcher = TlsFetcher::from_config(&cfg)?;

    let started = Instant::now();
    let results = {
        let bar = progress::ProbeBar::start(targets.len(), cmd.quiet);
        let on_progress: ProgressCallback = Box::new(move |event| match event {
            ProbeProgress::Started { target } => bar.set_message(format!("Checking {target}...")),
            ProbeProgress::Finished { .. } => bar.inc(),
        });
        prober::perform_probe(&targets, &cfg, &fetcher, Some(on_progress)).await
    };
    info!("Run finished in {:.2?}", started.elapsed());

    let rendered = report::format_results(&results, cmd.output_format())?;
    println!("{}", rendered.trim_end_matches('\n'));
    Ok(())
}
