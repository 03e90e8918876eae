//! `.procura.toml` loading and flag resolution.
//!
//! Precedence is always: command-line flag > config file > built-in default.

use crate::discover::DEFAULT_PATTERNS;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use colored::Colorize;
use procura_core::{FieldSchema, SchemaOverrides};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = ".procura.toml";

pub const DEFAULT_INPUT_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "result";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for `procura extract`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractConfig>,

    /// Per-field additions, keyed by canonical field name
    #[serde(skip_serializing_if = "SchemaOverrides::is_empty")]
    pub schema: SchemaOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Directory the output files are written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Output files to write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<OutputFormat>>,

    /// Worker threads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,

    /// Exit successfully even when some documents failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,

    /// File-name globs matched recursively under the input directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,

    /// Write the date column as a spreadsheet text formula
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excel_safe_dates: Option<bool>,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid TOML for [`Config`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            eprintln!(
                "{} Failed to parse config file: {}",
                "Error:".red().bold(),
                path.display()
            );
            eprintln!("{} {}", "Parse error:".yellow().bold(), e);
            eprintln!();
            eprintln!("{} Configuration file syntax:", "Help:".cyan().bold());
            eprintln!("  [extract]");
            eprintln!("  output_dir = \"result\"");
            eprintln!("  formats = [\"csv\", \"jsonl\"]");
            eprintln!("  parallel = 4");
            eprintln!();
            eprintln!("  [schema.\"供应商名称\"]");
            eprintln!("  aliases = [\"中选供应商\"]");
            anyhow::anyhow!("Failed to parse config file: {e}")
        })?;

        Ok(config)
    }

    /// The explicit `--config` file, else `.procura.toml` in the current
    /// directory, else built-in defaults.
    ///
    /// # Errors
    ///
    /// An explicit path that is missing or invalid is an error. A broken
    /// implicit file is reported as a warning and ignored.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let implicit = Path::new(CONFIG_FILE_NAME);
        if !implicit.exists() {
            return Ok(Self::default());
        }
        match Self::load_from_file(implicit) {
            Ok(config) => {
                log::debug!("loaded {}", implicit.display());
                Ok(config)
            }
            Err(e) => {
                eprintln!(
                    "{} Ignoring {}: {}",
                    "Warning:".yellow().bold(),
                    implicit.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// The built-in field table with `[schema.*]` applied.
    ///
    /// # Errors
    ///
    /// Unknown field names and fallback patterns that do not compile.
    pub fn field_schema(&self) -> Result<FieldSchema> {
        FieldSchema::with_overrides(&self.schema).context("Invalid [schema] section")
    }
}

/// What the user passed on the command line for `extract`.
#[derive(Debug, Clone, Default)]
pub struct ExtractFlags {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub formats: Vec<OutputFormat>,
    pub parallel: Option<usize>,
    pub continue_on_error: bool,
}

/// Fully resolved settings for one `extract` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub formats: Vec<OutputFormat>,
    pub workers: usize,
    pub continue_on_error: bool,
    pub patterns: Vec<String>,
    pub excel_safe_dates: bool,
}

impl ExtractSettings {
    #[must_use]
    pub fn resolve(flags: &ExtractFlags, config: Option<&ExtractConfig>) -> Self {
        let config = config.cloned().unwrap_or_default();

        let formats = if flags.formats.is_empty() {
            config
                .formats
                .filter(|formats| !formats.is_empty())
                .unwrap_or_else(|| vec![OutputFormat::Csv, OutputFormat::Jsonl])
        } else {
            flags.formats.clone()
        };
        let mut formats = formats;
        formats.sort();
        formats.dedup();

        let workers = flags
            .parallel
            .or(config.parallel)
            .unwrap_or_else(default_workers)
            .max(1);

        let patterns = config
            .patterns
            .filter(|patterns| !patterns.is_empty())
            .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(ToString::to_string).collect());

        Self {
            input_dir: flags
                .input_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            output_dir: flags
                .output_dir
                .clone()
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            formats,
            workers,
            continue_on_error: flags.continue_on_error || config.continue_on_error.unwrap_or(false),
            patterns,
            excel_safe_dates: config.excel_safe_dates.unwrap_or(true),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
