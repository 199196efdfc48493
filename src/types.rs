use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Naive timestamps are interpreted as UTC.
pub type Timestamp = NaiveDateTime;

pub const DNI_COLUMN: &str = "DNI";
pub const GENERATION_COLUMN: &str = "Solar Generation (kWh)";

pub fn to_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> Timestamp {
    dt.naive_utc()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SunPositionMethod {
    #[default]
    Psa,
}

impl SunPositionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Psa => "psa",
        }
    }
}

impl FromStr for SunPositionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "psa" => Ok(Self::Psa),
            other => Err(Error::InvalidArgument(format!(
                "unknown sun position method '{other}'"
            ))),
        }
    }
}

/// What to do when a modeled value comes out non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Let NaN flow into the output.
    #[default]
    Propagate,
    /// Stop at the first non-finite value with `Error::NumericAnomaly`.
    FailFast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    pub timestamp: Timestamp,
    pub azimuth: f64,
    pub zenith: f64,
}

/// Fixed flat-plate panel.
///
/// `tilt` is in radians and `orientation` is a compass bearing in degrees.
/// Values are kept exactly as given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelConfiguration {
    pub tilt: f64,
    pub orientation: f64,
    pub k: f64,
    pub c: f64,
    pub t_baseline: f64,
}

impl PanelConfiguration {
    pub const DEFAULT_C: f64 = 0.05;
    pub const DEFAULT_T_BASELINE: f64 = 25.0;

    pub fn new(tilt: f64, orientation: f64, k: f64) -> Self {
        Self {
            tilt,
            orientation,
            k,
            c: Self::DEFAULT_C,
            t_baseline: Self::DEFAULT_T_BASELINE,
        }
    }

    pub fn with_temperature(mut self, c: f64, t_baseline: f64) -> Self {
        self.c = c;
        self.t_baseline = t_baseline;
        self
    }

    pub fn temperature_factor(&self) -> f64 {
        1.0 + self.c * (self.t_baseline - 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub timestamp: Timestamp,
    pub values: Vec<Option<f64>>,
}

/// Timestamp-indexed measurements with named numeric columns.
///
/// Always carries a `DNI` column and never holds two rows with the same
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTable {
    columns: Vec<String>,
    rows: Vec<MeasurementRow>,
    dni_index: usize,
}

impl MeasurementTable {
    pub fn new(columns: Vec<String>, rows: Vec<MeasurementRow>) -> Result<Self> {
        let dni_index = columns
            .iter()
            .position(|c| c == DNI_COLUMN)
            .ok_or_else(|| Error::MissingColumn(DNI_COLUMN.to_string()))?;

        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.values.len() != columns.len() {
                return Err(Error::RowWidth {
                    timestamp: row.timestamp,
                    expected: columns.len(),
                    found: row.values.len(),
                });
            }
            if !seen.insert(row.timestamp) {
                return Err(Error::DuplicateTimestamp(row.timestamp));
            }
        }

        Ok(Self {
            columns,
            rows,
            dni_index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    pub fn dni(&self, row: &MeasurementRow) -> Option<f64> {
        row.values.get(self.dni_index).copied().flatten()
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Appends another table with the same column set, reordering its
    /// values to this table's column order.
    pub fn concat(self, other: MeasurementTable) -> Result<Self> {
        let mapping = other
            .columns
            .iter()
            .map(|c| self.columns.iter().position(|own| own == c))
            .collect::<Option<Vec<usize>>>();
        let mapping = match mapping {
            Some(m) if other.columns.len() == self.columns.len() => m,
            _ => {
                return Err(Error::Parse {
                    line: 0,
                    message: format!(
                        "column mismatch while concatenating: {:?} vs {:?}",
                        self.columns, other.columns
                    ),
                })
            }
        };

        let columns = self.columns;
        let mut rows = self.rows;
        rows.reserve(other.rows.len());
        for row in other.rows {
            let mut values = vec![None; columns.len()];
            for (src, &dst) in mapping.iter().enumerate() {
                values[dst] = row.values[src];
            }
            rows.push(MeasurementRow {
                timestamp: row.timestamp,
                values,
            });
        }
        MeasurementTable::new(columns, rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModeledPower {
    #[serde(rename = "time")]
    pub timestamp: Timestamp,
    pub max_generation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub timestamp: Timestamp,
    pub values: Vec<Option<f64>>,
    pub generation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedResult {
    pub columns: Vec<String>,
    pub generation_column: String,
    pub rows: Vec<MergedRow>,
}

impl MergedResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.rows.iter().filter(|r| r.generation.is_none()).count()
    }

    pub fn generation(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.generation).collect()
    }
}
