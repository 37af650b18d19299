use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sresolve",
    about = "sresolve - resolve video-hosting page URLs into proxy-ready stream descriptors",
    version,
    author
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Deadline in seconds for resolving one URL, all hops included; also
    /// bounds each request (defaults to the configured value)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Proxy URL (supports http, https, socks5)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Proxy username (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_username: Option<String>,

    /// Proxy password (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a page URL into a stream descriptor
    Resolve {
        /// The page URL to resolve
        #[arg(short, long)]
        url: String,

        /// Output format (defaults to the configured value)
        #[arg(short, long)]
        output: Option<OutputFormat>,

        /// Save output to file
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Resolve multiple URLs from a file
    Batch {
        /// Input file containing URLs (one per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for results
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, default_value = "json")]
        output_format: OutputFormat,

        /// Maximum concurrent resolutions (defaults to the configured value)
        #[arg(long)]
        max_concurrent: Option<usize>,
    },

    /// List supported sites
    Sites {
        /// Show the accepted domains of each site
        #[arg(short, long)]
        detailed: bool,

        /// Output format (defaults to the configured value)
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Show configuration information
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty-printed human-readable output
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// Compact JSON output
    JsonCompact,
    /// Table format
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonCompact => write!(f, "json-compact"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_resolve_with_global_flags() {
        let args = Args::try_parse_from([
            "sresolve",
            "resolve",
            "--url",
            "https://vk.com/video-1_2",
            "-o",
            "json-compact",
            "--timeout",
            "10",
            "--proxy",
            "socks5://127.0.0.1:1080",
        ])
        .unwrap();

        assert_eq!(args.timeout, Some(10));
        assert_eq!(args.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        match args.command {
            Commands::Resolve { url, output, .. } => {
                assert_eq!(url, "https://vk.com/video-1_2");
                assert_eq!(output, Some(OutputFormat::JsonCompact));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Args::try_parse_from(["sresolve", "-v", "-q", "sites"]);
        assert!(result.is_err());
    }
}
