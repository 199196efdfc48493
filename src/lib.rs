pub mod angles;
pub mod clear_sky;
pub mod config;
pub mod error;
pub mod ingest;
pub mod join;
pub mod nsrdb;
pub mod output;
pub mod pipeline;
pub mod telemetry;
pub mod types;

pub use angles::{
    compute_positions, compute_positions_by_name, deg_to_rad, normalize_angle, rad_to_deg,
    sun_position,
};

pub use clear_sky::ClearSkyPowerModel;

pub use config::{Config, WorkDirs};

pub use error::{Error, Result};

pub use join::merge;

pub use pipeline::Pipeline;

pub use types::{
    to_timestamp, Location, MeasurementRow, MeasurementTable, MergedResult, MergedRow,
    ModeledPower, NumericPolicy, PanelConfiguration, SunPosition, SunPositionMethod, Timestamp,
    DNI_COLUMN, GENERATION_COLUMN,
};
