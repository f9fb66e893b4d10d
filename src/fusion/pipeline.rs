use thiserror::Error;

use crate::{
    sensor::{SensorKind, SensorSample},
    transport::{OutboundChannel, TransportError},
};

use super::{
    bearing::BearingState,
    filter::{FilterState, LowPassFilter},
    orientation::OrientationEstimator,
};

/// Possible errors while processing a sensor sample
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("received non-finite {0} sample")]
    InvalidSample(SensorKind),
    #[error("failed to publish bearing: {0}")]
    Publish(#[from] TransportError),
}

/// Turns sensor samples into bearings and publishes them. A pipeline is
/// owned by a single listener thread and is never shared.
pub struct BearingPipeline {
    filter: LowPassFilter,
    gravity: FilterState,
    geomagnetic: FilterState,
    estimator: OrientationEstimator,
    state: BearingState,
    channel: Box<dyn OutboundChannel>,
}

impl BearingPipeline {
    pub fn new(channel: Box<dyn OutboundChannel>) -> Self {
        Self {
            filter: LowPassFilter::default(),
            gravity: FilterState::default(),
            geomagnetic: FilterState::default(),
            estimator: OrientationEstimator::new(),
            state: BearingState::default(),
            channel,
        }
    }

    /// Process a single sensor sample. Returns the bearing that was published,
    /// if the sample produced one.
    pub fn process(&mut self, sample: SensorSample) -> Result<Option<f32>, PipelineError> {
        if !sample.is_finite() {
            return Err(PipelineError::InvalidSample(sample.kind));
        }

        let state = match sample.kind {
            SensorKind::Accelerometer => &mut self.gravity,
            SensorKind::Magnetometer => &mut self.geomagnetic,
        };
        state.update(&self.filter, sample.values);

        // An estimate needs data from both sensors
        let (Some(gravity), Some(geomagnetic)) = (self.gravity.value(), self.geomagnetic.value())
        else {
            return Ok(None);
        };

        let orientation = self.estimator.estimate(gravity, geomagnetic);
        log::trace!(
            "Azimuth: {}, pitch: {}, roll: {}",
            orientation.azimuth,
            orientation.pitch,
            orientation.roll
        );
        let (state, bearing) = self.state.step(orientation.azimuth);
        if !self.state.is_calibrated() {
            if let Some(reference) = state.reference() {
                log::info!("Calibrated reference heading at {reference} degrees");
            }
        }
        self.state = state;

        let Some(bearing) = bearing else {
            return Ok(None);
        };
        self.channel.send(bearing)?;

        Ok(Some(bearing))
    }

    /// Returns the current calibration state
    pub fn state(&self) -> BearingState {
        self.state
    }

    /// Returns the topic bearings are published on
    pub fn topic(&self) -> &str {
        self.channel.topic()
    }
}
