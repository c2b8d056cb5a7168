pub mod probe;

use std::time::Duration;

use clap::{ArgAction, ArgGroup, Parser};
use tracing::level_filters::LevelFilter;

use certinfo_common::config::{DEFAULT_PORT, OutputFormat, parse_positive};
use certinfo_common::error::ValidationError;
use certinfo_common::network::proxy::{parse_port, parse_proxy_url};
use certinfo_common::network::target::check_target;

#[derive(Parser, Debug)]
#[command(name = "ssl-certinfo")]
#[command(version, about = "Collect information about the SSL certificates of a set of hosts.")]
#[command(group(ArgGroup::new("format").args(["table", "json", "yaml", "csv", "raw"])))]
pub struct CommandLine {
    /// Hostname, ip address, ip network (cidr or netmask) or range (start - end)
    #[arg(value_name = "HOST", value_parser = check_target)]
    pub hosts: Vec<String>,

    /// TCP port to connect to
    #[arg(short, long, default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    pub port: u16,

    /// Timeout of a single probe, in seconds
    #[arg(short, long, default_value_t = 5, value_parser = parse_positive)]
    pub timeout: u64,

    /// Proxy url, [protocol://]host[:port]. An empty value ignores the proxy environment variables
    #[arg(short = 'x', long, value_name = "URL", value_parser = check_proxy)]
    pub proxy: Option<String>,

    /// Number of probes running at the same time
    #[arg(short, long, default_value_t = 1, value_parser = parse_positive)]
    pub workers: u64,

    /// Print results as a table (default)
    #[arg(short = 'T', long)]
    pub table: bool,

    /// Print results as json
    #[arg(short, long)]
    pub json: bool,

    /// Print results as yaml
    #[arg(short, long)]
    pub yaml: bool,

    /// Print results as csv
    #[arg(short, long)]
    pub csv: bool,

    /// Print results as plain aligned columns
    #[arg(short, long)]
    pub raw: bool,

    /// Increase output verbosity, repeat for more
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.yaml {
            OutputFormat::Yaml
        } else if self.csv {
            OutputFormat::Csv
        } else if self.raw {
            OutputFormat::Raw
        } else {
            OutputFormat::Table
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn check_proxy(s: &str) -> Result<String, ValidationError> {
    parse_proxy_url(s).map(|_| s.to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
