use chrono::NaiveDate;

use solar_potential::types::*;
use solar_potential::{Error, Pipeline};

macro_rules! assert_approx {
    ($left:expr, $right:expr, $tol:expr) => {
        let (l, r) = ($left as f64, $right as f64);
        assert!(
            (l - r).abs() <= $tol,
            "assert_approx failed: left={}, right={}, diff={}, tol={}",
            l, r, (l - r).abs(), $tol
        );
    };
}

fn ts(hour: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2021, 6, 21)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn boulder() -> Pipeline {
    Pipeline::new(
        Location {
            latitude: 40.0,
            longitude: -105.0,
        },
        PanelConfiguration::new(0.6, 180.0, 1.0).with_temperature(0.05, 25.0),
    )
}

fn single_row(dni: Option<f64>) -> MeasurementTable {
    MeasurementTable::new(
        vec![DNI_COLUMN.to_string()],
        vec![MeasurementRow {
            timestamp: ts(12),
            values: vec![dni],
        }],
    )
    .unwrap()
}

// ── Round trip ──

#[test]
fn test_boulder_solstice_round_trip() {
    let merged = boulder().run(&single_row(Some(900.0))).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.rows[0].timestamp, ts(12));
    assert_eq!(merged.rows[0].values, vec![Some(900.0)]);
    let generation = merged.rows[0].generation.unwrap();
    assert_approx!(generation, -414.12127130653147, 1e-6);
}

#[test]
fn test_full_day_has_no_nulls() {
    let rows = (0..24)
        .map(|h| MeasurementRow {
            timestamp: ts(h),
            values: vec![Some(250.0), Some(h as f64 * 40.0)],
        })
        .collect();
    let table =
        MeasurementTable::new(vec!["GHI".to_string(), DNI_COLUMN.to_string()], rows).unwrap();
    let merged = boulder().run(&table).unwrap();
    assert_eq!(merged.len(), 24);
    assert_eq!(merged.null_count(), 0);
    assert_eq!(merged.rows[0].generation, Some(0.0));
}

#[test]
fn test_nan_flows_through_by_default() {
    let merged = boulder().run(&single_row(None)).unwrap();
    assert_eq!(merged.null_count(), 0);
    assert!(merged.rows[0].generation.unwrap().is_nan());
}

#[test]
fn test_fail_fast_policy() {
    let mut pipeline = boulder();
    pipeline.policy = NumericPolicy::FailFast;
    assert!(matches!(
        pipeline.run(&single_row(None)),
        Err(Error::NumericAnomaly { .. })
    ));
}

#[test]
fn test_polar_location_runs() {
    let mut pipeline = boulder();
    pipeline.location.latitude = 90.0;
    let merged = pipeline.run(&single_row(Some(900.0))).unwrap();
    assert!(merged.rows[0].generation.unwrap().is_finite());
}

// ── Table validation ──

#[test]
fn test_missing_dni_column_is_rejected() {
    let result = MeasurementTable::new(
        vec!["GHI".to_string()],
        vec![MeasurementRow {
            timestamp: ts(1),
            values: vec![Some(1.0)],
        }],
    );
    assert!(matches!(result, Err(Error::MissingColumn(c)) if c == "DNI"));
}

#[test]
fn test_duplicate_timestamps_are_rejected() {
    let row = MeasurementRow {
        timestamp: ts(1),
        values: vec![Some(1.0)],
    };
    let result = MeasurementTable::new(vec![DNI_COLUMN.to_string()], vec![row.clone(), row]);
    assert!(matches!(result, Err(Error::DuplicateTimestamp(t)) if t == ts(1)));
}

#[test]
fn test_row_width_is_checked() {
    let result = MeasurementTable::new(
        vec![DNI_COLUMN.to_string(), "GHI".to_string()],
        vec![MeasurementRow {
            timestamp: ts(1),
            values: vec![Some(1.0)],
        }],
    );
    assert!(matches!(
        result,
        Err(Error::RowWidth {
            expected: 2,
            found: 1,
            ..
        })
    ));
}

#[test]
fn test_method_parsing() {
    assert_eq!("psa".parse::<SunPositionMethod>().unwrap(), SunPositionMethod::Psa);
    assert!(matches!(
        "noaa".parse::<SunPositionMethod>(),
        Err(Error::InvalidArgument(_))
    ));
}
