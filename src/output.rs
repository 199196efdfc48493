use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::error::Result;
use crate::types::MergedResult;

pub const INDEX_COLUMN: &str = "datetime";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn output_file_name(latitude: f64, longitude: f64) -> String {
    format!("{latitude}_{longitude}_solar_generation.csv")
}

/// Missing and non-finite values are both written as empty cells.
fn cell(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.to_string())
        .unwrap_or_default()
}

pub fn write_csv<W: Write>(merged: &MergedResult, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = Vec::with_capacity(merged.columns.len() + 2);
    header.push(INDEX_COLUMN.to_string());
    header.extend(merged.columns.iter().cloned());
    header.push(merged.generation_column.clone());
    wtr.write_record(&header)?;

    for row in &merged.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.timestamp.format(TIMESTAMP_FORMAT).to_string());
        record.extend(row.values.iter().map(|v| cell(*v)));
        record.push(cell(row.generation));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_file(merged: &MergedResult, path: &Path) -> Result<()> {
    write_csv(merged, File::create(path)?)?;
    info!(path = %path.display(), rows = merged.len(), "wrote merged result");
    Ok(())
}
