use chrono::NaiveDate;
use rstest::rstest;

use solar_potential::angles::{compute_positions, sun_position};
use solar_potential::clear_sky::ClearSkyPowerModel;
use solar_potential::types::*;
use solar_potential::Error;

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

fn ts(hour: u32, minute: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2021, 6, 21)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn table(rows: &[(Timestamp, Option<f64>)]) -> MeasurementTable {
    MeasurementTable::new(
        vec!["GHI".to_string(), DNI_COLUMN.to_string()],
        rows.iter()
            .map(|&(timestamp, dni)| MeasurementRow {
                timestamp,
                values: vec![Some(1.0), dni],
            })
            .collect(),
    )
    .unwrap()
}

fn boulder_panel() -> PanelConfiguration {
    PanelConfiguration::new(0.6, 180.0, 1.0)
}

// ── PanelConfiguration ──

#[test]
fn test_panel_defaults() {
    let p = boulder_panel();
    assert_eq!(p.c, 0.05);
    assert_eq!(p.t_baseline, 25.0);
    assert_eq!(p.tilt, 0.6);
    assert_eq!(p.orientation, 180.0);
    assert_approx!(p.temperature_factor(), 2.25, 1e-12);
}

#[test]
fn test_panel_stored_verbatim() {
    let p = PanelConfiguration::new(34.5, 540.0, 0.8).with_temperature(-0.004, 20.0);
    assert_eq!(p.tilt, 34.5);
    assert_eq!(p.orientation, 540.0);
    assert_eq!(p.c, -0.004);
    assert_eq!(p.t_baseline, 20.0);
}

// ── Formula ──

#[test]
fn test_power_reference_values() {
    let model = ClearSkyPowerModel::new(boulder_panel());
    let dawn = sun_position(ts(12, 0), 40.0, -105.0);
    let noon = sun_position(ts(19, 0), 40.0, -105.0);
    assert_approx!(model.power(900.0, dawn.azimuth, dawn.zenith), -414.12127130653147, 1e-6);
    assert_approx!(model.power(900.0, noon.azimuth, noon.zenith), 1927.8460973765125, 1e-6);
}

#[test]
fn test_flat_panel_ignores_azimuth() {
    let model = ClearSkyPowerModel::new(PanelConfiguration::new(0.0, 180.0, 1.0));
    // horizontal panel: DNI * k * factor * cos(zenith)
    let expected = 800.0 * 2.25 * 60f64.to_radians().cos();
    for az in [0.0, 90.0, 180.0, 270.0] {
        assert_approx!(model.power(800.0, az, 60.0), expected, 1e-9);
    }
}

#[test]
fn test_sun_normal_to_panel() {
    let tilt_deg: f64 = 30.0;
    let model = ClearSkyPowerModel::new(
        PanelConfiguration::new(tilt_deg.to_radians(), 180.0, 0.5).with_temperature(0.0, 25.0),
    );
    assert_approx!(model.power(1000.0, 180.0, tilt_deg), 500.0, 1e-9);
}

#[rstest]
#[case(0.0, 0.0)]
#[case(62.4, 86.1)]
#[case(178.5, 16.6)]
#[case(300.0, 130.0)]
fn test_zero_dni_gives_zero(#[case] azimuth: f64, #[case] zenith: f64) {
    let model = ClearSkyPowerModel::new(boulder_panel());
    assert_eq!(model.power(0.0, azimuth, zenith), 0.0);
}

// ── compute_max_power ──

#[test]
fn test_output_matches_input_rows() {
    let times: Vec<Timestamp> = (0..24).map(|h| ts(h, 0)).collect();
    let rows: Vec<_> = times.iter().map(|&t| (t, Some(500.0))).collect();
    let measurements = table(&rows);
    let positions = compute_positions(&times, 40.0, -105.0, SunPositionMethod::Psa);
    let out = ClearSkyPowerModel::new(boulder_panel())
        .compute_max_power(&measurements, &positions)
        .unwrap();
    assert_eq!(out.len(), measurements.len());
    for (m, t) in out.iter().zip(&times) {
        assert_eq!(m.timestamp, *t);
        assert!(m.max_generation.is_finite());
    }
}

#[test]
fn test_all_zero_dni() {
    let times: Vec<Timestamp> = (0..24).map(|h| ts(h, 30)).collect();
    let rows: Vec<_> = times.iter().map(|&t| (t, Some(0.0))).collect();
    let measurements = table(&rows);
    let positions = compute_positions(&times, 40.0, -105.0, SunPositionMethod::Psa);
    let out = ClearSkyPowerModel::new(boulder_panel())
        .compute_max_power(&measurements, &positions)
        .unwrap();
    assert!(out.iter().all(|m| m.max_generation == 0.0));
}

#[test]
fn test_positions_aligned_by_timestamp_not_index() {
    let times = vec![ts(12, 0), ts(19, 0)];
    let measurements = table(&[(times[0], Some(900.0)), (times[1], Some(900.0))]);
    let mut positions = compute_positions(&times, 40.0, -105.0, SunPositionMethod::Psa);
    positions.reverse();
    let out = ClearSkyPowerModel::new(boulder_panel())
        .compute_max_power(&measurements, &positions)
        .unwrap();
    assert_eq!(out[0].timestamp, ts(12, 0));
    assert_approx!(out[0].max_generation, -414.12127130653147, 1e-6);
    assert_approx!(out[1].max_generation, 1927.8460973765125, 1e-6);
}

#[test]
fn test_missing_dni_propagates_nan() {
    let times = vec![ts(18, 0), ts(19, 0)];
    let measurements = table(&[(times[0], None), (times[1], Some(900.0))]);
    let positions = compute_positions(&times, 40.0, -105.0, SunPositionMethod::Psa);
    let out = ClearSkyPowerModel::new(boulder_panel())
        .compute_max_power(&measurements, &positions)
        .unwrap();
    assert!(out[0].max_generation.is_nan());
    assert!(out[1].max_generation.is_finite());
}

#[test]
fn test_missing_position_propagates_nan() {
    let measurements = table(&[(ts(18, 0), Some(900.0)), (ts(19, 0), Some(900.0))]);
    let positions = compute_positions(&[ts(19, 0)], 40.0, -105.0, SunPositionMethod::Psa);
    let out = ClearSkyPowerModel::new(boulder_panel())
        .compute_max_power(&measurements, &positions)
        .unwrap();
    assert!(out[0].max_generation.is_nan());
    assert_approx!(out[1].max_generation, 1927.8460973765125, 1e-6);
}

#[test]
fn test_fail_fast_reports_timestamp() {
    let measurements = table(&[(ts(18, 0), Some(900.0)), (ts(19, 0), None)]);
    let positions =
        compute_positions(&measurements.timestamps(), 40.0, -105.0, SunPositionMethod::Psa);
    let result = ClearSkyPowerModel::new(boulder_panel())
        .with_policy(NumericPolicy::FailFast)
        .compute_max_power(&measurements, &positions);
    match result {
        Err(Error::NumericAnomaly { timestamp }) => assert_eq!(timestamp, ts(19, 0)),
        other => panic!("expected NumericAnomaly, got {:?}", other),
    }
}
