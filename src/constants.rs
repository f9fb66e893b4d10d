use std::time::Duration;

/// Name of the topic that bearings are published on
pub const TOPIC_NAME: &str = "orientation";
/// Message type name declared when creating the bearing publisher
pub const TOPIC_TYPE: &str = "std_msgs/Float32";
/// Default name of the publishing node
pub const NODE_NAME: &str = "camera_controller/orientationPublisher";

/// Smoothing constant of the low-pass filter applied to raw sensor data
pub const SMOOTHING_ALPHA: f32 = 0.25;
/// Number of orientation estimates discarded before the reference heading is
/// latched.
pub const WARMUP_THRESHOLD: u32 = 20;
/// Requested sensor delivery period (50Hz)
pub const SENSOR_DELAY: Duration = Duration::from_micros(20_000);

/// Offset added to every bearing so the initial heading reads 90 degrees
pub const BEARING_OFFSET: f32 = 90.0;
/// Lower (inclusive) bound of the published bearing window
pub const BEARING_MIN: f32 = -90.0;
/// Upper (exclusive) bound of the published bearing window
pub const BEARING_MAX: f32 = 270.0;
