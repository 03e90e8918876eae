//! Command-line interface for `procura_core`
//!
//! This crate provides the `procura` tool, which runs the extraction engine
//! over a directory of saved procurement announcements and writes one record
//! per document.
//!
//! # Quick Start
//!
//! ```bash
//! # Extract everything under ./data into ./result/extracted.{csv,jsonl}
//! procura extract
//!
//! # Other directories, CSV only, eight workers
//! procura extract notices/ -o out/ --format csv --parallel 8
//!
//! # Plain-text rendering of one file
//! procura text notices/2021/0504.html
//!
//! # The field table in effect (after .procura.toml overrides)
//! procura fields
//! ```
//!
//! # Configuration
//!
//! `.procura.toml` in the current directory (or `--config <path>`) supplies
//! defaults. Command-line flags always win over the file.
//!
//! ```toml
//! [extract]
//! output_dir = "result"
//! formats = ["csv", "jsonl"]
//! parallel = 4
//! continue_on_error = true
//! patterns = ["*.htm*"]
//! excel_safe_dates = true
//!
//! [schema."供应商名称"]
//! aliases = ["中选供应商"]
//! ```
//!
//! The modules below are what the binary is made of; they are public so the
//! pieces can be reused and tested on their own.

pub mod config;
pub mod decode;
pub mod discover;
pub mod output;

pub use config::{Config, ExtractConfig, ExtractFlags, ExtractSettings};
pub use decode::{decode_html, read_html_file, DetectedEncoding};
pub use discover::discover_html_files;
pub use output::{write_outputs, OutputFormat};
