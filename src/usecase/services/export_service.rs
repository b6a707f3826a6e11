use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::domain::entities::dataset::FundRecord;

pub fn export_file_name(date: NaiveDate) -> String {
    format!("funds_export_{}.csv", date.format("%Y-%m-%d"))
}

pub fn today_export_file_name() -> String {
    export_file_name(chrono::Local::now().date_naive())
}

/// Header of `columns` followed by one line per record. Fields are quoted only
/// when they hold a comma, a double quote or a line break; missing values are
/// written as empty fields. With a single column an empty value is written
/// as `""` so the row survives as a record instead of a blank line.
pub fn export_csv<'a, I>(columns: &[String], records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a FundRecord>,
{
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(columns)
        .context("failed to write csv header")?;

    let mut row_count = 0_usize;
    for record in records {
        writer
            .write_record(columns.iter().map(|column| record.get(column).to_text()))
            .context("failed to write csv record")?;
        row_count += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv export: {err}"))?;
    tracing::info!(rows = row_count, columns = columns.len(), "csv export built");
    Ok(bytes)
}

pub fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export dir: {}", parent.display()))?;
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write export: {}", path.display()))?;
    Ok(())
}
