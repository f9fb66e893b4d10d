use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    constants::WARMUP_THRESHOLD,
    fusion::pipeline::{BearingPipeline, PipelineError},
    sensor::{SensorKind, SensorSample},
    transport::{OutboundChannel, TransportError},
};

const LEVEL: [f32; 3] = [0.0, 0.0, 9.81];
const NORTH: [f32; 3] = [0.0, 22.0, -42.0];
const EAST: [f32; 3] = [-22.0, 0.0, -42.0];

/// Outbound channel that records every published value
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    pub values: Arc<Mutex<Vec<f32>>>,
    /// Set when the channel is dropped
    pub dropped: Arc<AtomicBool>,
    pub fail: bool,
}

impl RecordingChannel {
    /// Create a channel that fails every send
    pub fn failing() -> Self {
        Self {
            values: Arc::default(),
            dropped: Arc::default(),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<f32> {
        self.values.lock().expect("lock should not be poisoned").clone()
    }
}

impl OutboundChannel for RecordingChannel {
    fn topic(&self) -> &str {
        "test"
    }

    fn send(&self, value: f32) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::InvalidTopic("test".to_string()));
        }
        self.values
            .lock()
            .expect("lock should not be poisoned")
            .push(value);
        Ok(())
    }
}

impl Drop for RecordingChannel {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::Release);
    }
}

fn accel(values: [f32; 3]) -> SensorSample {
    SensorSample::new(SensorKind::Accelerometer, values)
}

fn magn(values: [f32; 3]) -> SensorSample {
    SensorSample::new(SensorKind::Magnetometer, values)
}

#[test]
fn test_estimates_need_both_sensors() -> Result<(), Box<dyn Error>> {
    let channel = RecordingChannel::default();
    let mut pipeline = BearingPipeline::new(Box::new(channel.clone()));

    // Accelerometer samples alone never qualify
    for _ in 0..50 {
        assert_eq!(pipeline.process(accel(LEVEL))?, None);
    }
    assert_eq!(pipeline.state().reference(), None);
    assert!(!pipeline.state().is_calibrated());

    // The first magnetometer sample makes every following sample qualify
    assert_eq!(pipeline.process(magn(NORTH))?, None);
    assert!(channel.published().is_empty());

    Ok(())
}

#[test]
fn test_publishes_after_warm_up() -> Result<(), Box<dyn Error>> {
    let channel = RecordingChannel::default();
    let mut pipeline = BearingPipeline::new(Box::new(channel.clone()));

    // Not qualifying: no gravity yet
    assert_eq!(pipeline.process(magn(NORTH))?, None);

    // Qualifying samples 1 through 20 are discarded
    for _ in 0..WARMUP_THRESHOLD {
        assert_eq!(pipeline.process(accel(LEVEL))?, None);
    }
    assert!(channel.published().is_empty());

    // The 21st qualifying sample latches the reference and publishes 90
    let bearing = pipeline
        .process(accel(LEVEL))?
        .expect("should publish a bearing");
    assert!((bearing - 90.0).abs() < 1e-3);
    assert_eq!(channel.published().len(), 1);

    // Every sample after that publishes exactly one value
    for i in 0..5 {
        assert!(pipeline.process(magn(NORTH))?.is_some());
        assert_eq!(channel.published().len(), i + 2);
    }

    Ok(())
}

#[test]
fn test_turning_changes_bearing() -> Result<(), Box<dyn Error>> {
    let channel = RecordingChannel::default();
    let mut pipeline = BearingPipeline::new(Box::new(channel.clone()));
    pipeline.process(accel(LEVEL))?;
    pipeline.process(magn(NORTH))?;
    for _ in 0..WARMUP_THRESHOLD {
        pipeline.process(accel(LEVEL))?;
    }
    assert!(pipeline.state().is_calibrated());

    // Turn to face east and let the filter settle
    let mut bearing = None;
    for _ in 0..100 {
        bearing = pipeline.process(magn(EAST))?;
    }
    let bearing = bearing.expect("should publish a bearing");
    assert!((bearing - 180.0).abs() < 0.5, "unexpected bearing {bearing}");

    Ok(())
}

#[test]
fn test_invalid_samples_are_rejected() -> Result<(), Box<dyn Error>> {
    let channel = RecordingChannel::default();
    let mut pipeline = BearingPipeline::new(Box::new(channel));
    pipeline.process(accel(LEVEL))?;

    let result = pipeline.process(magn([f32::NAN, 0.0, 0.0]));
    assert!(matches!(
        result,
        Err(PipelineError::InvalidSample(SensorKind::Magnetometer))
    ));

    // The rejected sample must not poison the filter state
    pipeline.process(magn(NORTH))?;
    for _ in 0..WARMUP_THRESHOLD {
        pipeline.process(accel(LEVEL))?;
    }
    assert!(pipeline.state().is_calibrated());

    Ok(())
}

#[test]
fn test_publish_failure_keeps_state() -> Result<(), Box<dyn Error>> {
    let channel = RecordingChannel::failing();
    let mut pipeline = BearingPipeline::new(Box::new(channel));
    pipeline.process(accel(LEVEL))?;
    for _ in 0..WARMUP_THRESHOLD {
        pipeline.process(magn(NORTH))?;
    }

    let result = pipeline.process(magn(NORTH));
    assert!(matches!(result, Err(PipelineError::Publish(_))));
    assert!(pipeline.state().is_calibrated());

    Ok(())
}
