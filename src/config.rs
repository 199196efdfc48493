use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::nsrdb::{DownloadRequest, Interval};
use crate::pipeline::Pipeline;
use crate::types::{Location, NumericPolicy, PanelConfiguration, SunPositionMethod};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "SOLAR_POTENTIAL__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub location: Location,
    pub panel: PanelConfig,
    pub model: ModelConfig,
    pub nsrdb: NsrdbConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub tilt_rad: f64,
    pub orientation_deg: f64,
    pub k: f64,
    pub c: f64,
    pub t_baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub sun_position_method: String,
    pub numeric_policy: NumericPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NsrdbConfig {
    pub base_url: String,
    pub api_key: String,
    pub email: String,
    pub attributes: Vec<String>,
    pub interval: u32,
    pub years: Vec<i32>,
    pub to_utc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub work_dir: PathBuf,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: Location {
                latitude: 40.0,
                longitude: -105.0,
            },
            panel: PanelConfig {
                tilt_rad: 0.6,
                orientation_deg: 180.0,
                k: 1.0,
                c: PanelConfiguration::DEFAULT_C,
                t_baseline: PanelConfiguration::DEFAULT_T_BASELINE,
            },
            model: ModelConfig {
                sun_position_method: SunPositionMethod::Psa.as_str().to_string(),
                numeric_policy: NumericPolicy::Propagate,
            },
            nsrdb: NsrdbConfig {
                base_url: crate::nsrdb::DEFAULT_BASE_URL.to_string(),
                api_key: String::new(),
                email: String::new(),
                attributes: vec!["ghi".into(), "dni".into(), "dew_point".into()],
                interval: 60,
                years: vec![2021],
                to_utc: false,
            },
            paths: PathsConfig {
                work_dir: PathBuf::from("temp"),
                data_dir: PathBuf::from("temp/solar_data"),
                output_dir: PathBuf::from("."),
            },
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (if present), then `SOLAR_POTENTIAL__*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        debug!(path = %path.display(), "loading configuration");
        Self::figment(path)
            .extract()
            .map_err(|e| Error::Config(Box::new(e)))
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn panel(&self) -> PanelConfiguration {
        PanelConfiguration::new(
            self.panel.tilt_rad,
            self.panel.orientation_deg,
            self.panel.k,
        )
        .with_temperature(self.panel.c, self.panel.t_baseline)
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new(self.location, self.panel());
        pipeline.method = self.model.sun_position_method.parse()?;
        pipeline.policy = self.model.numeric_policy;
        Ok(pipeline)
    }

    /// One request per configured year.
    pub fn download_requests(&self) -> Result<Vec<DownloadRequest>> {
        let interval = Interval::try_from(self.nsrdb.interval)?;
        Ok(self
            .nsrdb
            .years
            .iter()
            .map(|&year| DownloadRequest {
                attributes: self.nsrdb.attributes.clone(),
                interval,
                location: self.location,
                year,
                to_utc: self.nsrdb.to_utc,
            })
            .collect())
    }

    pub fn work_dirs(&self) -> WorkDirs {
        WorkDirs {
            work_dir: self.paths.work_dir.clone(),
            data_dir: self.paths.data_dir.clone(),
            output_dir: self.paths.output_dir.clone(),
        }
    }
}

/// Directories used by the download and output steps. Nothing is created
/// until [`WorkDirs::ensure`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirs {
    pub work_dir: PathBuf,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl WorkDirs {
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.work_dir, &self.data_dir, &self.output_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn archive_path(&self, year: i32) -> PathBuf {
        self.work_dir.join(format!("solar_data_{year}.zip"))
    }

    /// Unpacks the archive for `year` into `data_dir/<archive stem>/` and
    /// returns that directory.
    pub fn extract_archive(&self, year: i32) -> Result<PathBuf> {
        let archive_path = self.archive_path(year);
        let stem = archive_path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| format!("solar_data_{year}").into());
        let mut archive = ZipArchive::new(std::fs::File::open(&archive_path)?)?;
        let dest = self.data_dir.join(stem);
        std::fs::create_dir_all(&dest)?;
        archive.extract(&dest)?;
        info!(
            year,
            entries = archive.len(),
            dest = %dest.display(),
            "extracted archive"
        );
        Ok(dest)
    }

    /// Empties the data directory, extracted sub-directories included.
    /// Returns the number of top-level entries removed.
    pub fn clean_data_dir(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else {
                std::fs::remove_file(&path)?;
            }
            removed += 1;
        }
        debug!(removed, dir = %self.data_dir.display(), "cleaned data directory");
        Ok(removed)
    }
}
