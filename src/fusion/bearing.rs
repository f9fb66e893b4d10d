use crate::constants::{BEARING_MAX, BEARING_MIN, BEARING_OFFSET, WARMUP_THRESHOLD};

/// Calibration state of the bearing calculation.
///
/// Orientation estimates are discarded while [BearingState::WarmingUp] so the
/// filters have time to converge. The estimate that reaches the warm-up
/// threshold becomes the reference heading, and every estimate from then on
/// produces a bearing relative to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BearingState {
    /// Number of estimates discarded so far
    WarmingUp(u32),
    /// Reference azimuth in degrees
    Calibrated { reference: f32 },
}

impl Default for BearingState {
    fn default() -> Self {
        BearingState::WarmingUp(0)
    }
}

impl BearingState {
    /// Advance the state with the given azimuth in radians. Returns the next
    /// state and the bearing to publish, if any.
    pub fn step(self, azimuth: f32) -> (BearingState, Option<f32>) {
        let degrees = azimuth.to_degrees();
        match self {
            BearingState::WarmingUp(count) if count < WARMUP_THRESHOLD => {
                (BearingState::WarmingUp(count + 1), None)
            }
            BearingState::WarmingUp(_) => {
                let state = BearingState::Calibrated { reference: degrees };
                (state, Some(bearing(degrees, degrees)))
            }
            BearingState::Calibrated { reference } => (self, Some(bearing(degrees, reference))),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, BearingState::Calibrated { .. })
    }

    /// Returns the reference azimuth in degrees once calibrated
    pub fn reference(&self) -> Option<f32> {
        match self {
            BearingState::WarmingUp(_) => None,
            BearingState::Calibrated { reference } => Some(*reference),
        }
    }
}

/// Calculate the bearing in degrees of the given azimuth relative to the
/// reference azimuth, both in degrees.
pub fn bearing(azimuth: f32, reference: f32) -> f32 {
    wrap(azimuth - reference + BEARING_OFFSET)
}

/// Wrap the given angle in degrees into [BEARING_MIN, BEARING_MAX)
pub fn wrap(angle: f32) -> f32 {
    let mut angle = angle;
    if angle < BEARING_MIN {
        angle += 360.0;
    } else if angle >= BEARING_MAX {
        angle -= 360.0;
    }

    // Values just below the lower bound can round up onto the upper bound
    if angle >= BEARING_MAX {
        angle -= 360.0;
    }
    angle
}
