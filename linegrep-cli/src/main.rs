use clap::Parser;
use linegrep::{search, EncodingMode, LineSource, SearchConfig, SearchError};
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pattern to search for (regex unless -F is given)
    pattern: String,

    /// File to search; reads standard input when omitted
    file: Option<PathBuf>,

    /// Ignore case distinctions in the pattern and the input
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Treat the pattern as a fixed string, not a regular expression
    #[arg(short = 'F', long)]
    fixed_string: bool,

    /// Select non-matching lines
    #[arg(short = 'v', long)]
    invert_match: bool,

    /// Print only a count of selected lines
    #[arg(short = 'c', long)]
    count: bool,

    /// Prefix each printed line with its 1-based line number
    #[arg(short = 'n', long)]
    line_number: bool,

    /// Number of context lines after each match
    #[arg(short = 'A', long, default_value = "0", value_name = "N")]
    after_context: usize,

    /// Number of context lines before each match
    #[arg(short = 'B', long, default_value = "0", value_name = "N")]
    before_context: usize,

    /// Number of context lines around each match (overrides -A and -B)
    #[arg(short = 'C', long, value_name = "N")]
    context: Option<usize>,

    /// Path to a configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of threads to use for the match phase
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// How to handle invalid UTF-8 in the input (failfast|lossy)
    #[arg(long, default_value = "failfast")]
    encoding: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("linegrep: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .map_err(|e| SearchError::config_error(e.to_string()))?;

    let encoding_mode = match cli.encoding.to_lowercase().as_str() {
        "lossy" => EncodingMode::Lossy,
        _ => EncodingMode::FailFast,
    };

    let cli_config = SearchConfig {
        pattern: cli.pattern,
        fixed_string: cli.fixed_string,
        ignore_case: cli.ignore_case,
        invert_match: cli.invert_match,
        count_only: cli.count,
        line_numbers: cli.line_number,
        context_before: cli.before_context,
        context_after: cli.after_context,
        context: cli.context,
        thread_count: cli.threads.unwrap_or(file_config.thread_count),
        log_level: cli.log_level,
        encoding_mode,
    };

    let config = file_config.merge_with_cli(cli_config);
    init_tracing(&config.log_level);

    let lines = LineSource::from_arg(cli.file).read_lines(config.encoding_mode)?;
    debug!("Read {} input lines", lines.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    search::run(&lines, &config, &mut out)
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
