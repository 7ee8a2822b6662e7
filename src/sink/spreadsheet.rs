//! Spreadsheet sink: logical sheets written as one CSV file per sheet into
//! the job's output directory (`data`, `raw`, `meta`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::parser::ExtractedMeasurement;
use crate::sidra::reshape::{wide_headers, WideRow};
use crate::sidra::SidraTable;

/// Fixed column order of the one-row measurement sheet.
const MEASUREMENT_HEADERS: [&str; 8] = [
    "reporting_period",
    "reference_period",
    "index_value",
    "pct_change_month",
    "pct_change_year",
    "pct_change_12m",
    "source_checksum",
    "source",
];

/// Writes named sheets under one directory, one `<sheet>.csv` each.
pub struct SheetWriter {
    dir: PathBuf,
}

impl SheetWriter {
    pub fn create(dir: impl Into<PathBuf>) -> Result<SheetWriter> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(SheetWriter { dir })
    }

    pub fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    fn write_sheet<S: AsRef<str>>(
        &self,
        name: &str,
        headers: &[S],
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> Result<()> {
        let path = self.sheet_path(name);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        writer.write_record(headers.iter().map(|h| h.as_ref()))?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Metadata accompanying a statistics export.
pub struct ExportMeta<'a> {
    pub name: &'a str,
    pub dataset_path: &'a str,
    pub url: &'a str,
    pub content_type: &'a str,
}

/// Write the `data` (pivoted), `raw` (payload verbatim) and `meta` sheets.
pub fn write_sidra_sheets(
    dir: &Path,
    meta: &ExportMeta<'_>,
    table: &SidraTable,
    wide: &[WideRow],
) -> Result<()> {
    let writer = SheetWriter::create(dir)?;

    let data_rows = wide.iter().map(|row| {
        let mut cells = vec![
            row.year.map(|y| y.to_string()).unwrap_or_default(),
            row.month.clone().unwrap_or_default(),
        ];
        cells.extend(row.values.iter().map(format_value));
        cells
    });
    writer.write_sheet("data", &wide_headers(), data_rows)?;

    let raw_rows = table.raw_rows.iter().map(|row| {
        table
            .columns
            .iter()
            .map(|col| row.get(col).cloned().unwrap_or_default())
            .collect()
    });
    writer.write_sheet("raw", &table.columns, raw_rows)?;

    let meta_headers = [
        "name",
        "dataset_path",
        "url",
        "content_type",
        "rows_raw",
        "rows_data",
        "collected_at",
    ];
    let meta_row = vec![
        meta.name.to_string(),
        meta.dataset_path.to_string(),
        meta.url.to_string(),
        meta.content_type.to_string(),
        table.raw_rows.len().to_string(),
        wide.len().to_string(),
        Utc::now().to_rfc3339(),
    ];
    writer.write_sheet("meta", &meta_headers, [meta_row])?;

    Ok(())
}

/// Write the one-row `data` sheet plus the recognized text as the `raw`
/// sheet.
pub fn write_measurement_sheets(
    dir: &Path,
    measurement: &ExtractedMeasurement,
    source: &str,
    recognized_text: &str,
) -> Result<()> {
    let writer = SheetWriter::create(dir)?;

    let row = vec![
        measurement.reporting_period.to_string(),
        measurement.reference_period.to_string(),
        format!("{}", measurement.index_value),
        format!("{}", measurement.pct_change_month),
        format!("{}", measurement.pct_change_year),
        format!("{}", measurement.pct_change_12m),
        measurement.source_checksum.clone(),
        source.to_string(),
    ];
    writer.write_sheet("data", &MEASUREMENT_HEADERS, [row])?;

    let raw_rows = recognized_text.lines().map(|line| vec![line.to_string()]);
    writer.write_sheet("raw", &["recognized_text"], raw_rows)?;

    Ok(())
}

fn format_value(v: &Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}
