use colored::*;
use tracing::level_filters::LevelFilter;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::filter::IndicatifFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

/// One line per event, prefixed with a colored severity symbol.
///
/// Events carrying a `host` field get it printed in bold ahead of the message.
pub struct CertinfoFormatter;

impl<S, N> FormatEvent<S, N> for CertinfoFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) =
            match *event.metadata().level() {
                Level::TRACE => ("[ ]", |s| s.dimmed()),
                Level::DEBUG => ("[?]", |s| s.blue()),
                Level::INFO => ("[+]", |s| s.green().bold()),
                Level::WARN => ("[*]", |s| s.yellow().bold()),
                Level::ERROR => ("[-]", |s| s.red().bold()),
            };

        let mut fields = EventFields::default();
        event.record(&mut fields);

        write!(writer, "{} ", color_func(symbol.into()))?;
        if let Some(host) = &fields.host {
            write!(writer, "{}: ", host.bold())?;
        }
        write!(writer, "{}", fields.message)?;
        for extra in &fields.extra {
            write!(writer, " {}", extra.dimmed())?;
        }

        writeln!(writer)
    }
}

/// Fields of a single event, split into the parts the formatter lays out.
#[derive(Default)]
struct EventFields {
    host: Option<String>,
    message: String,
    extra: Vec<String>,
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "host" => self.host = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => self.extra.push(format!("{name}={value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "host" => self.host = Some(format!("{value:?}")),
            "message" => self.message = format!("{value:?}"),
            name => self.extra.push(format!("{name}={value:?}")),
        }
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Log lines go to stderr through
/// the indicatif layer so they are printed above the progress bar.
pub fn init_logging(level: LevelFilter) {
    let indicatif_layer = IndicatifLayer::new();

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .event_format(CertinfoFormatter)
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .init();
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
