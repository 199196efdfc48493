use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

use tracing::{debug, warn};

use crate::angles::deg_to_rad;
use crate::error::{Error, Result};
use crate::types::{
    MeasurementTable, ModeledPower, NumericPolicy, PanelConfiguration, SunPosition, Timestamp,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearSkyPowerModel {
    panel: PanelConfiguration,
    policy: NumericPolicy,
}

impl ClearSkyPowerModel {
    pub fn new(panel: PanelConfiguration) -> Self {
        Self {
            panel,
            policy: NumericPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: NumericPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn panel(&self) -> &PanelConfiguration {
        &self.panel
    }

    /// Power for a single DNI reading and sun position (degrees).
    ///
    /// All angles are taken to radians before the trigonometry.
    pub fn power(&self, dni: f64, azimuth: f64, zenith: f64) -> f64 {
        let p = &self.panel;
        let zenith = deg_to_rad(zenith);
        let azimuth = deg_to_rad(azimuth);
        let orientation = deg_to_rad(p.orientation);
        dni * p.k
            * p.temperature_factor()
            * ((FRAC_PI_2 - zenith).cos() * p.tilt.sin() * (azimuth - orientation).cos()
                + (FRAC_PI_2 - zenith).sin() * p.tilt.cos())
    }

    /// One modeled value per measurement row, in table order. Positions are
    /// matched by timestamp, so their order does not matter.
    pub fn compute_max_power(
        &self,
        measurements: &MeasurementTable,
        positions: &[SunPosition],
    ) -> Result<Vec<ModeledPower>> {
        let by_time: HashMap<Timestamp, &SunPosition> =
            positions.iter().map(|p| (p.timestamp, p)).collect();

        let mut out = Vec::with_capacity(measurements.len());
        let mut non_finite = 0usize;
        for row in measurements.rows() {
            let dni = measurements.dni(row).unwrap_or(f64::NAN);
            let value = match by_time.get(&row.timestamp) {
                Some(pos) => self.power(dni, pos.azimuth, pos.zenith),
                None => f64::NAN,
            };
            if !value.is_finite() {
                if self.policy == NumericPolicy::FailFast {
                    return Err(Error::NumericAnomaly {
                        timestamp: row.timestamp,
                    });
                }
                non_finite += 1;
            }
            out.push(ModeledPower {
                timestamp: row.timestamp,
                max_generation: value,
            });
        }

        if non_finite > 0 {
            warn!(non_finite, "modeled power contains non-finite values");
        }
        debug!(rows = out.len(), "computed clear-sky max power");
        Ok(out)
    }
}
