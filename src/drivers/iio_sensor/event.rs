/// AxisData represents a processed (x, y, z) reading of an IIO sensor
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AxisData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AxisData {
    /// Returns the reading as single precision values
    pub fn values(&self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}
