//! Sensor fusion stages that turn raw accelerometer and magnetometer samples
//! into a stabilized bearing.
pub mod bearing;
pub mod filter;
pub mod orientation;
pub mod pipeline;

#[cfg(test)]
pub mod pipeline_test;

/// A three component (x, y, z) vector of sensor data
pub type Vector = [f32; 3];
