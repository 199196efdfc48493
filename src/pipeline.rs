use tracing::{info, info_span};

use crate::angles::compute_positions;
use crate::clear_sky::ClearSkyPowerModel;
use crate::error::Result;
use crate::join::merge;
use crate::types::{
    Location, MeasurementTable, MergedResult, NumericPolicy, PanelConfiguration, SunPositionMethod,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pipeline {
    pub location: Location,
    pub panel: PanelConfiguration,
    pub method: SunPositionMethod,
    pub policy: NumericPolicy,
}

impl Pipeline {
    pub fn new(location: Location, panel: PanelConfiguration) -> Self {
        Self {
            location,
            panel,
            method: SunPositionMethod::default(),
            policy: NumericPolicy::default(),
        }
    }

    pub fn run(&self, measurements: &MeasurementTable) -> Result<MergedResult> {
        let _span = info_span!(
            "generation_potential",
            latitude = self.location.latitude,
            longitude = self.location.longitude
        )
        .entered();

        let positions = compute_positions(
            &measurements.timestamps(),
            self.location.latitude,
            self.location.longitude,
            self.method,
        );
        let model = ClearSkyPowerModel::new(self.panel).with_policy(self.policy);
        let modeled = model.compute_max_power(measurements, &positions)?;
        let merged = merge(measurements, &modeled);

        info!(
            rows = merged.len(),
            nulls = merged.null_count(),
            "generation potential computed"
        );
        Ok(merged)
    }
}
