use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{MeasurementRow, MeasurementTable, Timestamp};

pub const METADATA_LINES: usize = 2;
const TIME_COLUMNS: [&str; 5] = ["Year", "Month", "Day", "Hour", "Minute"];

struct Layout {
    time_idx: [usize; 5],
    value_idx: Vec<usize>,
    columns: Vec<String>,
}

fn layout(header: &StringRecord) -> Result<Layout> {
    let mut time_idx = [0usize; 5];
    for (slot, name) in time_idx.iter_mut().zip(TIME_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
    }
    let (value_idx, columns): (Vec<usize>, Vec<String>) = header
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty() && !TIME_COLUMNS.contains(&h.trim()))
        .map(|(i, h)| (i, h.trim().to_string()))
        .unzip();
    Ok(Layout {
        time_idx,
        value_idx,
        columns,
    })
}

fn field<'a>(record: &'a StringRecord, idx: usize, line: usize) -> Result<&'a str> {
    record.get(idx).map(str::trim).ok_or_else(|| Error::Parse {
        line,
        message: format!("missing field {idx}"),
    })
}

fn parse_int(record: &StringRecord, idx: usize, line: usize) -> Result<u32> {
    let raw = field(record, idx, line)?;
    // some exports write integral fields as "2021.0"
    raw.parse::<u32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && *v >= 0.0)
                .map(|v| v as u32)
        })
        .ok_or_else(|| Error::Parse {
            line,
            message: format!("expected an integer, found '{raw}'"),
        })
}

fn parse_timestamp(record: &StringRecord, idx: &[usize; 5], line: usize) -> Result<Timestamp> {
    let year = parse_int(record, idx[0], line)? as i32;
    let month = parse_int(record, idx[1], line)?;
    let day = parse_int(record, idx[2], line)?;
    let hour = parse_int(record, idx[3], line)?;
    let minute = parse_int(record, idx[4], line)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| Error::Parse {
            line,
            message: format!("invalid date {year}-{month}-{day} {hour}:{minute}"),
        })
}

fn parse_value(raw: &str, line: usize) -> Result<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| Error::Parse {
        line,
        message: format!("expected a number, found '{raw}'"),
    })
}

/// Two metadata lines, the column header, then one record per interval.
/// `Year`, `Month`, `Day`, `Hour` and `Minute` form the timestamp and are
/// left out of the value columns.
pub fn read_nsrdb_csv<R: Read>(reader: R) -> Result<MeasurementTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records().skip(METADATA_LINES);
    let header = records.next().ok_or_else(|| Error::Parse {
        line: METADATA_LINES + 1,
        message: "missing column header".to_string(),
    })??;
    let layout = layout(&header)?;

    let mut rows = Vec::new();
    for (i, record) in records.enumerate() {
        let line = METADATA_LINES + 2 + i;
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let timestamp = parse_timestamp(&record, &layout.time_idx, line)?;
        let values = layout
            .value_idx
            .iter()
            .map(|&idx| parse_value(record.get(idx).map(str::trim).unwrap_or(""), line))
            .collect::<Result<Vec<_>>>()?;
        rows.push(MeasurementRow { timestamp, values });
    }

    MeasurementTable::new(layout.columns, rows)
}

pub fn load_file(path: &Path) -> Result<MeasurementTable> {
    let table = read_nsrdb_csv(File::open(path)?)?;
    debug!(path = %path.display(), rows = table.len(), "loaded measurement file");
    Ok(table)
}

/// Every `*.csv` file one directory below `root`, in sorted path order.
pub fn discover_csv_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let nested = entry?.path();
        if !nested.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(&nested)? {
            let path = file?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Loads and concatenates every CSV under `root`. A timestamp present in
/// more than one file is rejected.
pub fn load_directory(root: &Path) -> Result<MeasurementTable> {
    let files = discover_csv_files(root)?;
    let mut tables = files.iter().map(|p| load_file(p));
    let first = tables.next().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no csv files under {}", root.display()),
        ))
    })??;
    let table = tables.try_fold(first, |acc, next| acc.concat(next?))?;
    info!(files = files.len(), rows = table.len(), "loaded measurements");
    Ok(table)
}
