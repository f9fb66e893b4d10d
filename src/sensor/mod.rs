pub mod iio;
pub mod synthetic;
pub mod virt;


use std::{error::Error, fmt, time::Duration};

use thiserror::Error;

use crate::listener::client::ListenerClient;

/// The kinds of motion sensors used to estimate orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Measures acceleration in meters per second squared. At rest this is
    /// the direction of gravity.
    Accelerometer,
    /// Measures the ambient geomagnetic field in micro tesla
    Magnetometer,
}

impl SensorKind {
    /// All sensor kinds required to estimate orientation
    pub const ALL: [SensorKind; 2] = [SensorKind::Accelerometer, SensorKind::Magnetometer];
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Accelerometer => write!(f, "accelerometer"),
            SensorKind::Magnetometer => write!(f, "magnetometer"),
        }
    }
}

/// A single (x, y, z) reading from a sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub kind: SensorKind,
    pub values: [f32; 3],
}

impl SensorSample {
    pub fn new(kind: SensorKind, values: [f32; 3]) -> Self {
        Self { kind, values }
    }

    /// Returns true if every component of the sample is a finite number
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// A sensor that listeners can be registered with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sensor {
    pub kind: SensorKind,
    /// Backend specific identifier (E.g. "iio:device3")
    pub id: String,
    pub name: String,
}

/// Possible errors from a [SensorManager]
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("no default sensor available for {0}")]
    NotFound(SensorKind),
    #[error("listener is already registered with sensor {0}")]
    AlreadyRegistered(String),
    #[error("sensor driver error: {0}")]
    Driver(Box<dyn Error + Send + Sync>),
}

/// A [SensorManager] provides access to the motion sensors of a device and
/// delivers their samples to registered listeners.
pub trait SensorManager: Send + Sync {
    /// Returns the default sensor of the given kind, if one exists
    fn default_sensor(&self, kind: SensorKind) -> Option<Sensor>;

    /// Start delivering samples from the given sensor to the listener. The
    /// period is a hint for how often samples should be delivered.
    fn register_listener(
        &self,
        listener: ListenerClient,
        sensor: &Sensor,
        period: Duration,
    ) -> Result<(), SensorError>;

    /// Stop delivering samples from the given sensor to the listener. This
    /// does nothing if the listener was never registered.
    fn unregister_listener(&self, listener: &ListenerClient, sensor: &Sensor);
}
