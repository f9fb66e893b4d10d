use crate::constants::SMOOTHING_ALPHA;

use super::Vector;

/// Exponential moving average used to smooth noisy sensor data
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter {
    alpha: f32,
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new(SMOOTHING_ALPHA)
    }
}

impl LowPassFilter {
    pub fn new(alpha: f32) -> Self {
        Self { alpha }
    }

    /// Smooth the raw reading against the previous output. With no previous
    /// output the raw reading is returned as-is.
    ///   out[i] = out[i] + alpha * (raw[i] - out[i])
    pub fn apply(&self, raw: Vector, previous: Option<Vector>) -> Vector {
        let Some(mut out) = previous else {
            return raw;
        };
        for (value, raw) in out.iter_mut().zip(raw) {
            *value += self.alpha * (raw - *value);
        }
        out
    }
}

/// Running output of the [LowPassFilter] for a single sensor
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterState {
    value: Option<Vector>,
}

impl FilterState {
    /// Feed a raw reading through the filter, updating and returning the
    /// smoothed value.
    pub fn update(&mut self, filter: &LowPassFilter, raw: Vector) -> Vector {
        let value = filter.apply(raw, self.value);
        self.value = Some(value);
        value
    }

    /// Returns the current smoothed value, if any reading has been seen
    pub fn value(&self) -> Option<Vector> {
        self.value
    }
}
