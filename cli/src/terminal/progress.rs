use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
    "▁▁▁▁▁",
];

/// Progress bar of a probe run, drawn on stderr by the indicatif layer.
///
/// The bar lives as long as its span: dropping the handle removes it.
pub struct ProbeBar {
    span: Option<Span>,
}

impl ProbeBar {
    pub fn start(total: u128, hidden: bool) -> Self {
        if hidden || total == 0 {
            return Self { span: None };
        }

        let span = info_span!("probe", indicatif.pb_show = true);
        span.pb_set_style(&bar_style());
        span.pb_set_length(u64::try_from(total).unwrap_or(u64::MAX));
        span.pb_start();

        Self { span: Some(span) }
    }

    pub fn set_message(&self, msg: String) {
        if let Some(span) = &self.span {
            span.pb_set_message(&msg);
        }
    }

    pub fn inc(&self) {
        if let Some(span) = &self.span {
            span.pb_inc(1);
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} [{bar:30.green/white}] {pos}/{len} ({elapsed})")
        .map(|style| style.tick_strings(TICK_STRINGS).progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
