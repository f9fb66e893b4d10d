use std::{collections::HashMap, error::Error};

use industrial_io::{Channel, ChannelType, Device};

use super::{event::AxisData, info::AxisInfo, info::MountMatrix};

/// Driver for reading three axis data from an IIO sensor, such as an
/// accelerometer or a magnetometer.
pub struct Driver {
    name: String,
    mount_matrix: MountMatrix,
    channels: HashMap<String, Channel>,
    channel_info: HashMap<String, AxisInfo>,
}

impl Driver {
    pub fn new(
        id: String,
        name: String,
        channel_type: ChannelType,
        matrix: Option<MountMatrix>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        log::debug!("Creating IIO {channel_type:?} driver instance for {name}");

        // Create an IIO local context used to query for devices
        let ctx = industrial_io::context::Context::new()?;
        log::debug!("IIO context version: {}", ctx.version());

        let Some(device) = ctx.find_device(id.as_str()) else {
            return Err(format!("Failed to find device {id}").into());
        };

        // Try finding the mount matrix to determine how the sensor was mounted
        // inside the device.
        let mount_matrix = if let Some(matrix) = matrix {
            matrix
        } else if let Some(mount) = device.find_channel("mount", industrial_io::Direction::Input) {
            let matrix_str = mount.attr_read_str("matrix")?;
            log::debug!("Found mount matrix: {matrix_str}");
            let matrix = MountMatrix::new(matrix_str)?;
            log::debug!("Decoded mount matrix: {matrix}");
            matrix
        } else {
            MountMatrix::default()
        };

        let (channels, channel_info) = get_channels_with_type(&device, channel_type);
        if channels.is_empty() {
            return Err(format!("No {channel_type:?} channels found on {name}").into());
        }
        for info in channel_info.iter() {
            log::debug!("Found channel info: {:?}", info);
        }

        Ok(Self {
            name,
            mount_matrix,
            channels,
            channel_info,
        })
    }

    /// Name of the IIO device being read
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Read all axes of the sensor
    pub fn poll(&self) -> Result<AxisData, Box<dyn Error + Send + Sync>> {
        let mut input = AxisData::default();
        for (id, channel) in self.channels.iter() {
            let Some(info) = self.channel_info.get(id) else {
                continue;
            };
            let value = info.process(channel.attr_read_int("raw")?);
            if id.ends_with('x') {
                input.x = value;
            }
            if id.ends_with('y') {
                input.y = value;
            }
            if id.ends_with('z') {
                input.z = value;
            }
        }
        rotate_value(&self.mount_matrix, &mut input);

        Ok(input)
    }
}

/// Rotate the given axis data according to the mount matrix. This is used
/// to calculate the final value according to the sensor oritentation.
// Values are intended to be multiplied as:
//   x' = mxx * x + myx * y + mzx * z
//   y' = mxy * x + myy * y + mzy * z
//   z' = mxz * x + myz * y + mzz * z
pub fn rotate_value(matrix: &MountMatrix, value: &mut AxisData) {
    let x = value.x;
    let y = value.y;
    let z = value.z;
    value.x = matrix.x.0 * x + matrix.x.1 * y + matrix.x.2 * z;
    value.y = matrix.y.0 * x + matrix.y.1 * y + matrix.y.2 * z;
    value.z = matrix.z.0 * x + matrix.z.1 * y + matrix.z.2 * z;
}

/// Returns true if the given device has any channels of the given type
pub fn has_channel_type(device: &Device, channel_type: ChannelType) -> bool {
    device
        .channels()
        .any(|channel| channel.channel_type() == channel_type)
}

/// Returns all channels and channel information from the given device matching
/// the given channel type.
fn get_channels_with_type(
    device: &Device,
    channel_type: ChannelType,
) -> (HashMap<String, Channel>, HashMap<String, AxisInfo>) {
    let mut channels = HashMap::new();
    let mut channel_info = HashMap::new();
    device
        .channels()
        .filter(|channel| channel.channel_type() == channel_type)
        .for_each(|channel| {
            let Some(id) = channel.id() else {
                log::warn!("Unable to get channel id for channel: {:?}", channel);
                return;
            };
            log::debug!("Found channel: {id}");

            let offset = match channel.attr_read_int("offset") {
                Ok(v) => v,
                Err(e) => {
                    log::debug!("Unable to read offset for channel {id}: {:?}", e);
                    0
                }
            };

            let sample_rate = match channel.attr_read_float("sampling_frequency") {
                Ok(v) => v,
                Err(e) => {
                    log::debug!("Unable to read sample rate for channel {id}: {:?}", e);
                    0.0
                }
            };

            // Scale normalizes values into real units (E.g. m/s^2 or gauss)
            let scale = match channel.attr_read_float("scale") {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Unable to read scale for channel {id}: {:?}", e);
                    1.0
                }
            };

            let info = AxisInfo {
                offset,
                sample_rate,
                scale,
            };
            channel_info.insert(id.clone(), info);
            channels.insert(id, channel);
        });

    (channels, channel_info)
}
