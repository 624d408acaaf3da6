use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Configuration for a search.
///
/// # Configuration Locations
///
/// Values are loaded from the following files, later files overriding
/// earlier ones:
/// 1. Global `$CONFIG_DIR/fgrep/config.yaml`
/// 2. Local `.fgrep.yaml` in the current directory
/// 3. A file passed explicitly (the CLI's `--config`)
///
/// Command line arguments are merged on top with [`SearchConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Directory to search
/// root_path: "/var/log"
///
/// # Substring the file name must contain
/// file_pattern: ".log"
///
/// # Substring the file content must contain (case-insensitive)
/// content_pattern: "timeout"
///
/// # Size of the worker pool, 0 searches on the calling thread only
/// worker_count: 4
///
/// # Files larger than this many KB are not content searched
/// max_file_size_kb: 2000
///
/// # Paths to skip, relative to root_path (glob syntax)
/// ignore_patterns:
///   - ".git/**"
///
/// # Print matching fragments instead of file paths
/// show_content: false
///
/// # Only print the summary line
/// stats_only: false
///
/// # Level of the diagnostics printed with --verbose
/// # (trace, debug, info, warn, error)
/// log_level: "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Root directory to start search from
    #[serde(default)]
    pub root_path: Option<PathBuf>,

    /// Substring that file names must contain
    #[serde(default)]
    pub file_pattern: String,

    /// Substring searched for in file contents
    #[serde(default)]
    pub content_pattern: String,

    /// Number of workers in the pool
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Largest file, in KB, whose content is searched
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,

    /// Patterns to ignore (glob syntax, relative to the root)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether matches are reported as content fragments rather than paths
    #[serde(default)]
    pub show_content: bool,

    /// Whether to only show the summary line
    #[serde(default)]
    pub stats_only: bool,

    /// Level of the diagnostics printed in verbose mode
    /// (trace, debug, info, warn, error). Nothing is logged without it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_MAX_FILE_SIZE_KB: u64 = 2000;

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_max_file_size_kb() -> u64 {
    DEFAULT_MAX_FILE_SIZE_KB
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            file_pattern: String::new(),
            content_pattern: String::new(),
            worker_count: default_worker_count(),
            max_file_size_kb: default_max_file_size_kb(),
            ignore_patterns: Vec::new(),
            show_content: false,
            stats_only: false,
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations plus `config_path`
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("fgrep/config.yaml")),
            Some(PathBuf::from(".fgrep.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// CLI values take precedence whenever they differ from the defaults.
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        if cli_config.root_path.is_some() {
            self.root_path = cli_config.root_path;
        }
        if !cli_config.file_pattern.is_empty() {
            self.file_pattern = cli_config.file_pattern;
        }
        if !cli_config.content_pattern.is_empty() {
            self.content_pattern = cli_config.content_pattern;
        }
        if cli_config.worker_count != default_worker_count() {
            self.worker_count = cli_config.worker_count;
        }
        if cli_config.max_file_size_kb != default_max_file_size_kb() {
            self.max_file_size_kb = cli_config.max_file_size_kb;
        }
        if !cli_config.ignore_patterns.is_empty() {
            self.ignore_patterns = cli_config.ignore_patterns;
        }
        if cli_config.show_content {
            self.show_content = true;
        }
        if cli_config.stats_only {
            self.stats_only = true;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }

    /// Whether any search criteria were given
    pub fn has_criteria(&self) -> bool {
        !self.file_pattern.is_empty() || !self.content_pattern.is_empty()
    }

    /// Checks the configuration is usable for a search
    pub fn validate(&self) -> SearchResult<()> {
        if !self.has_criteria() {
            return Err(SearchError::config_error(
                "No search criteria specified, a file name or content pattern is required",
            ));
        }
        if self.root_path.is_none() {
            return Err(SearchError::config_error("No directory specified"));
        }
        Ok(())
    }
}
