/// Frames darker than this mean intensity count as a covered camera.
pub const MIN_BRIGHTNESS: f64 = 20.0;

/// Most faces allowed in frame.
pub const MAX_FACES: usize = 1;

/// Largest eye-line tilt accepted, in degrees.
pub const ROLL_THRESHOLD_DEG: f64 = 25.0;

/// Largest head turn accepted, in degrees.
pub const YAW_THRESHOLD_DEG: f64 = 35.0;

/// Acceptance thresholds applied by the frame classifier.
///
/// Angle limits are exclusive: a pose exactly at the limit passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerificationPolicy {
    pub min_brightness: f64,
    pub max_faces: usize,
    pub roll_threshold_deg: f64,
    pub yaw_threshold_deg: f64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            min_brightness: MIN_BRIGHTNESS,
            max_faces: MAX_FACES,
            roll_threshold_deg: ROLL_THRESHOLD_DEG,
            yaw_threshold_deg: YAW_THRESHOLD_DEG,
        }
    }
}

impl VerificationPolicy {
    pub fn is_too_dark(&self, mean_intensity: f64) -> bool {
        mean_intensity < self.min_brightness
    }

    pub fn is_too_many_faces(&self, count: usize) -> bool {
        count > self.max_faces
    }

    pub fn is_tilted(&self, roll_deg: f64) -> bool {
        roll_deg.abs() > self.roll_threshold_deg
    }

    pub fn is_looking_away(&self, yaw_deg: f64) -> bool {
        yaw_deg.abs() > self.yaw_threshold_deg
    }
}
