//! Record writers: `extracted.csv` and `extracted.jsonl`.

use anyhow::{Context, Result};
use clap::ValueEnum;
use procura_core::{FieldName, Record};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Spreadsheet-friendly CSV (UTF-8 with BOM)
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "extracted.csv",
            Self::Jsonl => "extracted.jsonl",
        }
    }
}

/// Write `records` in every requested format under `output_dir`, creating
/// it if needed. Returns the paths written.
///
/// # Errors
///
/// Any failure to create the directory or write a file.
pub fn write_outputs(
    records: &[&Record],
    output_dir: &Path,
    formats: &[OutputFormat],
    excel_safe_dates: bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = output_dir.join(format.file_name());
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let writer = BufWriter::new(file);
        let result = match format {
            OutputFormat::Csv => write_csv(writer, records, excel_safe_dates),
            OutputFormat::Jsonl => write_jsonl(writer, records),
        };
        result.with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("wrote {} records to {}", records.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// CSV with a BOM and the canonical field names as header.
///
/// With `excel_safe_dates` a non-empty date is written as `="<date>"`, which
/// spreadsheets show as plain text instead of reformatting it.
pub fn write_csv<W: Write>(mut writer: W, records: &[&Record], excel_safe_dates: bool) -> Result<()> {
    writer.write_all(UTF8_BOM)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(FieldName::ALL.iter().map(|field| field.as_str()))?;

    for record in records {
        let row = record.iter().map(|(field, value)| {
            if excel_safe_dates && field == FieldName::AnnouncementDate && !value.is_empty() {
                format!("=\"{value}\"")
            } else {
                value.to_string()
            }
        });
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// One JSON object per line, keys in field order, non-ASCII kept as is.
pub fn write_jsonl<W: Write>(mut writer: W, records: &[&Record]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
