use std::collections::HashMap;

use tracing::{debug, warn};

use crate::types::{
    MeasurementTable, MergedResult, MergedRow, ModeledPower, Timestamp, GENERATION_COLUMN,
};

/// Left join of modeled power onto the measurements by timestamp.
///
/// Every measurement row is kept in order. Modeled rows without a matching
/// measurement are dropped. Repeated modeled timestamps repeat the matching
/// measurement row, so callers should pass a unique series.
pub fn merge(measurements: &MeasurementTable, modeled: &[ModeledPower]) -> MergedResult {
    let mut by_time: HashMap<Timestamp, Vec<f64>> = HashMap::with_capacity(modeled.len());
    for m in modeled {
        by_time.entry(m.timestamp).or_default().push(m.max_generation);
    }

    let mut rows = Vec::with_capacity(measurements.len());
    let mut multiplied = 0usize;
    for row in measurements.rows() {
        match by_time.get(&row.timestamp) {
            Some(values) => {
                multiplied += values.len() - 1;
                for &v in values {
                    rows.push(MergedRow {
                        timestamp: row.timestamp,
                        values: row.values.clone(),
                        generation: Some(v),
                    });
                }
            }
            None => rows.push(MergedRow {
                timestamp: row.timestamp,
                values: row.values.clone(),
                generation: None,
            }),
        }
    }

    if multiplied > 0 {
        warn!(
            extra_rows = multiplied,
            "duplicate modeled timestamps multiplied measurement rows"
        );
    }

    let merged = MergedResult {
        columns: measurements.columns().to_vec(),
        generation_column: GENERATION_COLUMN.to_string(),
        rows,
    };
    debug!(
        rows = merged.len(),
        nulls = merged.null_count(),
        "merged modeled power"
    );
    merged
}
