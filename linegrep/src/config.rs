use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Configuration for a search pass. Built once by the CLI layer (or a test)
/// and never mutated afterwards; the engine only ever sees `&SearchConfig`.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.linegrep.yaml` in the current directory
/// 3. Global `$HOME/.config/linegrep/config.yaml`
///
/// # Configuration Format
///
/// The configuration uses YAML format. Example:
/// ```yaml
/// # Search pattern (regex unless fixed_string is set)
/// pattern: "TODO|FIXME"
///
/// # Treat the pattern as a literal string
/// fixed_string: false
///
/// # Case-insensitive matching
/// ignore_case: true
///
/// # Context lines around each match
/// context_before: 2
/// context_after: 2
///
/// # Thread count for the match phase (default: CPU cores)
/// thread_count: 4
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
///
/// # CLI Integration
///
/// When using the CLI, command-line arguments take precedence over config file
/// values. The merging behavior is defined in the `merge_with_cli` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The search pattern (regex unless `fixed_string` is set)
    #[serde(default)]
    pub pattern: String,

    /// Treat the pattern as a literal string instead of a regular expression
    #[serde(default)]
    pub fixed_string: bool,

    /// Lowercase-fold both pattern and lines before matching
    #[serde(default)]
    pub ignore_case: bool,

    /// Select lines that do NOT match the pattern
    #[serde(default)]
    pub invert_match: bool,

    /// Print only the number of selected lines
    #[serde(default)]
    pub count_only: bool,

    /// Prefix each printed line with its 1-based line number
    #[serde(default)]
    pub line_numbers: bool,

    /// Number of context lines to show before each match
    #[serde(default)]
    pub context_before: usize,

    /// Number of context lines to show after each match
    #[serde(default)]
    pub context_after: usize,

    /// Combined context: when set, overrides both `context_before` and
    /// `context_after` with the same value
    #[serde(default)]
    pub context: Option<usize>,

    /// Number of threads to use for the match phase
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How invalid UTF-8 in the input is handled
    #[serde(default)]
    pub encoding_mode: EncodingMode,
}

/// How to handle invalid UTF-8 sequences in the input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Fail with an encoding error on the first invalid sequence
    #[default]
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep going
    Lossy,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            fixed_string: false,
            ignore_case: false,
            invert_match: false,
            count_only: false,
            line_numbers: false,
            context_before: 0,
            context_after: 0,
            context: None,
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            encoding_mode: EncodingMode::FailFast,
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Default config locations
        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("linegrep/config.yaml")),
            // Local config
            Some(PathBuf::from(".linegrep.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        // Add existing config files
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // Build and deserialize
        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        // CLI values take precedence over config file values
        if !cli_config.pattern.is_empty() {
            self.pattern = cli_config.pattern;
        }
        if cli_config.fixed_string {
            self.fixed_string = true;
        }
        if cli_config.ignore_case {
            self.ignore_case = true;
        }
        if cli_config.invert_match {
            self.invert_match = true;
        }
        if cli_config.count_only {
            self.count_only = true;
        }
        if cli_config.line_numbers {
            self.line_numbers = true;
        }
        if cli_config.context_before != 0 {
            self.context_before = cli_config.context_before;
        }
        if cli_config.context_after != 0 {
            self.context_after = cli_config.context_after;
        }
        if cli_config.context.is_some() {
            self.context = cli_config.context;
        }
        // Always use CLI thread count if specified
        self.thread_count = cli_config.thread_count;
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        if cli_config.encoding_mode != EncodingMode::default() {
            self.encoding_mode = cli_config.encoding_mode;
        }
        self
    }

    /// Effective context window as `(before, after)`, with the combined
    /// `context` override applied. Resolved here so the range builder only
    /// ever sees plain before/after counts.
    pub fn context_window(&self) -> (usize, usize) {
        match self.context {
            Some(n) => (n, n),
            None => (self.context_before, self.context_after),
        }
    }
}
