use std::error::Error;

use industrial_io::{ChannelType, Context};

use crate::{drivers::iio_sensor::driver::has_channel_type, sensor::SensorKind};

#[derive(Debug, Clone)]
pub struct Device {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Motion sensor kinds the device has channels for
    pub kinds: Vec<SensorKind>,
}

impl Device {
    /// Returns true if the device can provide readings of the given kind
    pub fn provides(&self, kind: SensorKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Returns the IIO channel type that provides readings of the given kind
pub fn channel_type(kind: SensorKind) -> ChannelType {
    match kind {
        SensorKind::Accelerometer => ChannelType::Accel,
        SensorKind::Magnetometer => ChannelType::Magn,
    }
}

/// Returns all iio devices on the system
pub fn list_devices() -> Result<Vec<Device>, Box<dyn Error + Send + Sync>> {
    let ctx = Context::new()?;
    let devices: Vec<Device> = ctx
        .devices()
        .map(|dev| {
            let kinds = SensorKind::ALL
                .into_iter()
                .filter(|kind| has_channel_type(&dev, channel_type(*kind)))
                .collect();
            Device {
                id: dev.id(),
                name: dev.name(),
                kinds,
            }
        })
        .collect();
    Ok(devices)
}
