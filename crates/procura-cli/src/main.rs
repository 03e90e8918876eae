use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use procura_cli::config::Config;
use procura_cli::{
    discover_html_files, read_html_file, write_outputs, ExtractFlags, ExtractSettings,
    OutputFormat,
};
use procura_core::batch::{run_batch, BatchItem};
use procura_core::text::html_to_plain_text;
use procura_core::{Extractor, Record};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Per-file results and debug logging
    Verbose,
}

impl Verbosity {
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "procura",
    about = "Extract procurement fields from saved announcement pages",
    long_about = "Extract announcement date, project, purchaser, supplier, award amount,\n\
                  category and subject matter from government procurement announcements\n\
                  saved as HTML.\n\
                  \n\
                  Defaults can be set via a .procura.toml configuration file.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show per-file results and debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Configuration file (default: ./.procura.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract records from every HTML file under a directory
    Extract {
        /// Directory searched recursively for *.htm* files (default: ./data)
        #[arg(value_name = "INPUT_DIR")]
        input_dir: Option<PathBuf>,

        /// Directory for extracted.csv / extracted.jsonl (default: ./result)
        #[arg(short, long, value_name = "OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Output format, repeatable (default: csv and jsonl)
        #[arg(short, long, value_enum)]
        format: Vec<OutputFormat>,

        /// Number of worker threads (default: number of CPUs)
        #[arg(short, long, value_name = "N")]
        parallel: Option<usize>,

        /// Exit successfully even when some files failed
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Print the plain-text rendering of one HTML file
    Text {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List the field table in effect
    Fields,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::discover(args.config.as_deref())?;

    match args.command {
        Commands::Extract {
            input_dir,
            output,
            format,
            parallel,
            continue_on_error,
        } => {
            let flags = ExtractFlags {
                input_dir,
                output_dir: output,
                formats: format,
                parallel,
                continue_on_error,
            };
            extract_command(&flags, &config, verbosity)
        }
        Commands::Text { file } => text_command(&file),
        Commands::Fields => fields_command(&config),
    }
}

fn extract_command(flags: &ExtractFlags, config: &Config, verbosity: Verbosity) -> Result<()> {
    let settings = ExtractSettings::resolve(flags, config.extract.as_ref());
    let extractor = Extractor::new(Arc::new(config.field_schema()?));
    let files = discover_html_files(&settings.input_dir, &settings.patterns)?;

    if files.is_empty() {
        log::warn!(
            "No HTML files found under {}; outputs not written.",
            settings.input_dir.display()
        );
        return Ok(());
    }

    if verbosity.should_show_output() {
        eprintln!(
            "{} Extracting {} files from {} ({} workers)",
            "Info:".blue().bold(),
            files.len(),
            settings.input_dir.display(),
            settings.workers
        );
    }

    let progress = if verbosity.should_show_output() {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
                )
                .expect("template is compile-time constant")
                .progress_chars("█▓▒░  "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let start_time = Instant::now();
    let report = run_batch(
        &files,
        settings.workers,
        |path: &PathBuf| BatchItem {
            id: display_name(path, &settings.input_dir),
            outcome: read_html_file(path).and_then(|(html, _)| extractor.extract_html(&html)),
        },
        |item| {
            progress.set_message(item.id.clone());
            progress.inc(1);
        },
    );
    progress.finish_and_clear();
    let elapsed = start_time.elapsed();

    for item in &report.items {
        match &item.outcome {
            Ok(_) if verbosity.is_verbose() => {
                eprintln!("{} {}", "✓".green().bold(), item.id.bright_white());
            }
            Ok(_) => {}
            Err(e) => {
                if verbosity.should_show_output() || !settings.continue_on_error {
                    eprintln!(
                        "{} {} - {}",
                        "✗".red().bold(),
                        item.id.bright_white(),
                        e.to_string().red()
                    );
                }
            }
        }
    }

    let records: Vec<&Record> = report.records().collect();
    if records.is_empty() {
        log::warn!("No records extracted; outputs not written.");
    } else {
        let written = write_outputs(
            &records,
            &settings.output_dir,
            &settings.formats,
            settings.excel_safe_dates,
        )?;
        if verbosity.should_show_output() {
            for path in &written {
                eprintln!("{} Wrote {}", "✓".green().bold(), path.display());
            }
        }
    }

    let stats = report.stats;
    if verbosity.should_show_output() {
        eprintln!("\n{}", "=== Extraction Summary ===".bold());
        eprintln!("{:<16} {}", "Total files:", stats.total.to_string().cyan());
        eprintln!("{:<16} {}", "Succeeded:", stats.succeeded.to_string().green());
        eprintln!(
            "{:<16} {}",
            "Failed:",
            if stats.failed > 0 {
                stats.failed.to_string().red()
            } else {
                stats.failed.to_string().normal()
            }
        );
        eprintln!("{:<16} {:.2}s", "Total time:", elapsed.as_secs_f64());
    }

    if stats.failed > 0 && !settings.continue_on_error {
        anyhow::bail!(
            "Extraction failed for {} of {} files",
            stats.failed,
            stats.total
        );
    }

    Ok(())
}

fn text_command(file: &Path) -> Result<()> {
    let (html, encoding) =
        read_html_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    log::debug!("{}: decoded as {encoding}", file.display());
    println!("{}", html_to_plain_text(&html));
    Ok(())
}

fn fields_command(config: &Config) -> Result<()> {
    let schema = config.field_schema()?;
    for definition in schema.iter() {
        let kind = if definition.multi { "multi" } else { "single" };
        println!(
            "{}  [{}]  {}",
            definition.name.as_str().bold(),
            kind.cyan(),
            definition.aliases.join(", ")
        );
    }
    Ok(())
}

/// Path relative to the input directory when possible.
fn display_name(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
