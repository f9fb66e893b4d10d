//! Synthetic motion source that feeds a [VirtualSensorManager] with the
//! readings of a device lying flat and slowly turning in place.
use std::{
    f32::consts::PI,
    sync::Arc,
    time::{Duration, Instant},
};

use rand::Rng;

use crate::config;

use super::{virt::VirtualSensorManager, SensorKind};

/// Standard gravity in meters per second squared
const GRAVITY: f32 = 9.81;
/// Horizontal component of the simulated geomagnetic field in micro tesla
const FIELD_HORIZONTAL: f32 = 22.0;
/// Vertical (downward) component of the simulated geomagnetic field
const FIELD_VERTICAL: f32 = 42.0;
/// Default rotation speed in degrees per second
const DEFAULT_ROTATION_SPEED: f64 = 15.0;
/// Default amplitude of noise added to each axis
const DEFAULT_NOISE: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SyntheticField {
    /// Degrees per second the simulated device turns clockwise
    rotation_speed: f32,
    noise: f32,
}

impl SyntheticField {
    pub fn new(rotation_speed: f32, noise: f32) -> Self {
        Self {
            rotation_speed,
            noise: noise.abs(),
        }
    }

    /// Create a synthetic field from the optional simulation config
    pub fn from_config(config: Option<&config::Simulation>) -> Self {
        let rotation_speed = config
            .and_then(|c| c.rotation_speed)
            .unwrap_or(DEFAULT_ROTATION_SPEED);
        let noise = config.and_then(|c| c.noise).unwrap_or(DEFAULT_NOISE);
        Self::new(rotation_speed as f32, noise as f32)
    }

    /// Returns the heading of the simulated device in radians after the
    /// given amount of time.
    pub fn heading(&self, elapsed: Duration) -> f32 {
        let degrees = self.rotation_speed * elapsed.as_secs_f32();
        (degrees % 360.0).to_radians()
    }

    /// Returns the reading of the given sensor after the given amount of time
    pub fn sample(&self, kind: SensorKind, elapsed: Duration) -> [f32; 3] {
        let values = match kind {
            SensorKind::Accelerometer => [0.0, 0.0, GRAVITY],
            SensorKind::Magnetometer => {
                // Magnetic north expressed in device coordinates
                let heading = self.heading(elapsed);
                [
                    -heading.sin() * FIELD_HORIZONTAL,
                    heading.cos() * FIELD_HORIZONTAL,
                    -FIELD_VERTICAL,
                ]
            }
        };
        self.add_noise(values)
    }

    fn add_noise(&self, values: [f32; 3]) -> [f32; 3] {
        if self.noise == 0.0 {
            return values;
        }
        let mut rng = rand::rng();
        values.map(|v| v + rng.random_range(-self.noise..=self.noise))
    }

    /// Feed samples of both sensor kinds into the given manager. Samples are
    /// produced at the period requested by the registered listeners, or at
    /// the given default period while nothing is registered. Runs until the
    /// task is cancelled.
    pub async fn run(self, manager: Arc<VirtualSensorManager>, default_period: Duration) {
        log::debug!(
            "Simulating device turning at {} degrees per second",
            self.rotation_speed
        );
        let start = Instant::now();
        loop {
            let elapsed = start.elapsed();
            for kind in SensorKind::ALL {
                if manager.listener_count(kind) == 0 {
                    continue;
                }
                manager.inject(kind, self.sample(kind, elapsed));
            }
            log::trace!(
                "Simulated heading: {}",
                self.heading(elapsed) * 180.0 / PI
            );

            let period = SensorKind::ALL
                .into_iter()
                .filter_map(|kind| manager.requested_period(kind))
                .min()
                .unwrap_or(default_period);
            tokio::time::sleep(period).await;
        }
    }
}
