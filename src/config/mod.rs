pub mod path;

#[cfg(test)]
pub mod config_test;

use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents all possible errors loading a [PublisherConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Environment specific settings of the bearing publisher. The fusion
/// constants themselves are not configurable.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PublisherConfig {
    pub version: u32,
    pub sensors: Option<Sensors>,
    pub simulation: Option<Simulation>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            version: 1,
            sensors: None,
            simulation: None,
        }
    }
}

impl PublisherConfig {
    /// Load a [PublisherConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<PublisherConfig, LoadError> {
        let config: PublisherConfig = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load a [PublisherConfig] from the given YAML file
    pub fn from_yaml_path(path: &Path) -> Result<PublisherConfig, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(content)
    }

    /// Load the config from the given path, or from the first config file found
    /// in the search paths. Falls back to the default config if no file exists.
    pub fn load(path: Option<&Path>) -> Result<PublisherConfig, LoadError> {
        if let Some(path) = path {
            log::debug!("Loading config from {path:?}");
            return Self::from_yaml_path(path);
        }

        for path in path::get_config_paths() {
            if !path.is_file() {
                continue;
            }
            log::debug!("Loading config from {path:?}");
            return Self::from_yaml_path(&path);
        }

        log::debug!("No config file found. Using defaults.");
        Ok(PublisherConfig::default())
    }

    /// Returns the IIO settings for the accelerometer
    pub fn accelerometer(&self) -> Option<&IIO> {
        self.sensors.as_ref().and_then(|s| s.accelerometer.as_ref())
    }

    /// Returns the IIO settings for the magnetometer
    pub fn magnetometer(&self) -> Option<&IIO> {
        self.sensors.as_ref().and_then(|s| s.magnetometer.as_ref())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Sensors {
    pub accelerometer: Option<IIO>,
    pub magnetometer: Option<IIO>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[allow(clippy::upper_case_acronyms)]
pub struct IIO {
    /// Glob matched against the IIO device name (E.g. "{accel_3d,bmi*}")
    pub name: Option<String>,
    pub mount_matrix: Option<MountMatrix>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct MountMatrix {
    pub x: [f64; 3],
    pub y: [f64; 3],
    pub z: [f64; 3],
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Simulation {
    /// Degrees per second the simulated device turns
    pub rotation_speed: Option<f64>,
    /// Amplitude of the uniform noise added to every axis
    pub noise: Option<f64>,
}
