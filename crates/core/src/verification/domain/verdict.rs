//! The single outcome of verifying one frame.
//!
//! Each variant carries only the fields valid for it, so an error can never
//! report angles and a success always does. Serializes to the wire shape
//! `{"status": ..., "reason"?: ..., "message": ..., "angles"?: {...}}`.

use std::fmt;

use serde::Serialize;

use super::head_pose::HeadPose;

pub const SUCCESS_MESSAGE: &str = "Face verified.";
pub const CAMERA_BLOCKED_MESSAGE: &str =
    "Camera is blocked or covered. Please uncover your camera.";
pub const NO_FACE_MESSAGE: &str = "No face detected. Please look directly at the camera.";
pub const LANDMARKS_LOST_MESSAGE: &str =
    "Could not track facial landmarks. Please face the camera directly.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    CameraBlocked,
    NoFace,
    MultipleFaces,
    HeadTilted,
    LookingAway,
}

/// Which way the candidate should correct, as shown to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn for_roll(roll_deg: f64) -> Self {
        if roll_deg > 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    pub fn for_yaw(yaw_deg: f64) -> Self {
        if yaw_deg < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => f.write_str("left"),
            Direction::Right => f.write_str("right"),
        }
    }
}

/// Head pose as reported to clients, rounded to one decimal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Angles {
    pub roll: f64,
    pub yaw: f64,
}

impl From<HeadPose> for Angles {
    fn from(pose: HeadPose) -> Self {
        Self {
            roll: round_tenths(pose.roll_deg),
            yaw: round_tenths(pose.yaw_deg),
        }
    }
}

/// Nearest tenth of the exact binary value, ties to even.
///
/// Formatting rounds the exact value once; scaling by ten first would round
/// twice and push values like 0.15 (stored just below) up to 0.2.
fn round_tenths(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Success {
        message: String,
        angles: Angles,
    },
    Warning {
        reason: WarningReason,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        angles: Option<Angles>,
    },
    Error {
        message: String,
    },
}

impl Verdict {
    pub fn success(pose: HeadPose) -> Self {
        Verdict::Success {
            message: SUCCESS_MESSAGE.to_string(),
            angles: pose.into(),
        }
    }

    pub fn camera_blocked() -> Self {
        Self::warning(WarningReason::CameraBlocked, CAMERA_BLOCKED_MESSAGE, None)
    }

    pub fn no_face() -> Self {
        Self::warning(WarningReason::NoFace, NO_FACE_MESSAGE, None)
    }

    /// A face was counted but its landmarks could not be tracked.
    pub fn landmarks_lost() -> Self {
        Self::warning(WarningReason::NoFace, LANDMARKS_LOST_MESSAGE, None)
    }

    pub fn multiple_faces(count: usize) -> Self {
        Self::warning(
            WarningReason::MultipleFaces,
            format!("Multiple people detected ({count}). Only the candidate is allowed."),
            None,
        )
    }

    pub fn head_tilted(pose: HeadPose) -> Self {
        let direction = Direction::for_roll(pose.roll_deg);
        Self::warning(
            WarningReason::HeadTilted,
            format!(
                "Head tilted too far to the {direction} ({:.0}deg). Please sit upright.",
                pose.roll_deg.abs()
            ),
            Some(pose.into()),
        )
    }

    pub fn looking_away(pose: HeadPose) -> Self {
        let direction = Direction::for_yaw(pose.yaw_deg);
        Self::warning(
            WarningReason::LookingAway,
            format!(
                "Looking too far {direction} ({:.0}deg). Please face forward.",
                pose.yaw_deg.abs()
            ),
            Some(pose.into()),
        )
    }

    pub fn error(message: impl Into<String>) -> Self {
        Verdict::Error {
            message: message.into(),
        }
    }

    fn warning(reason: WarningReason, message: impl Into<String>, angles: Option<Angles>) -> Self {
        Verdict::Warning {
            reason,
            message: message.into(),
            angles,
        }
    }

    /// True for malformed-request outcomes; warnings are not errors.
    pub fn is_error(&self) -> bool {
        matches!(self, Verdict::Error { .. })
    }

    pub fn reason(&self) -> Option<WarningReason> {
        match self {
            Verdict::Warning { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Verdict::Success { message, .. }
            | Verdict::Warning { message, .. }
            | Verdict::Error { message } => message,
        }
    }

    pub fn angles(&self) -> Option<Angles> {
        match self {
            Verdict::Success { angles, .. } => Some(*angles),
            Verdict::Warning { angles, .. } => *angles,
            Verdict::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use serde_json::json;

    fn pose(roll_deg: f64, yaw_deg: f64) -> HeadPose {
        HeadPose { roll_deg, yaw_deg }
    }

    // ── Direction ───────────────────────────────────────────────────

    #[rstest]
    #[case(30.0, Direction::Left)]
    #[case(-30.0, Direction::Right)]
    #[case(0.0, Direction::Right)]
    fn test_roll_direction(#[case] roll: f64, #[case] expected: Direction) {
        assert_eq!(Direction::for_roll(roll), expected);
    }

    #[rstest]
    #[case(-40.0, Direction::Left)]
    #[case(40.0, Direction::Right)]
    #[case(0.0, Direction::Right)]
    fn test_yaw_direction(#[case] yaw: f64, #[case] expected: Direction) {
        assert_eq!(Direction::for_yaw(yaw), expected);
    }

    // ── Angles ──────────────────────────────────────────────────────

    #[rstest]
    #[case(24.96, 25.0)]
    #[case(12.34, 12.3)]
    #[case(-7.26, -7.3)]
    #[case(0.0, 0.0)]
    #[case::tie_goes_to_even(0.25, 0.2)]
    #[case::negative_tie_goes_to_even(-0.25, -0.2)]
    #[case::tie_goes_to_even_upward(0.75, 0.8)]
    #[case::stored_below_half(0.15, 0.1)]
    #[case::stored_above_half(0.35, 0.3)]
    fn test_angles_round_to_one_decimal(#[case] raw: f64, #[case] rounded: f64) {
        let angles = Angles::from(pose(raw, raw));
        assert_relative_eq!(angles.roll, rounded, epsilon = 1e-12);
        assert_relative_eq!(angles.yaw, rounded, epsilon = 1e-12);
    }

    // ── Messages ────────────────────────────────────────────────────

    #[test]
    fn test_multiple_faces_message_has_count() {
        let v = Verdict::multiple_faces(3);
        assert_eq!(v.reason(), Some(WarningReason::MultipleFaces));
        assert_eq!(
            v.message(),
            "Multiple people detected (3). Only the candidate is allowed."
        );
        assert!(v.angles().is_none());
    }

    #[test]
    fn test_head_tilted_message() {
        let v = Verdict::head_tilted(pose(30.4, 2.0));
        assert_eq!(
            v.message(),
            "Head tilted too far to the left (30deg). Please sit upright."
        );
        assert_eq!(v.angles(), Some(Angles { roll: 30.4, yaw: 2.0 }));
    }

    #[test]
    fn test_head_tilted_right_uses_magnitude() {
        let v = Verdict::head_tilted(pose(-41.7, 0.0));
        assert_eq!(
            v.message(),
            "Head tilted too far to the right (42deg). Please sit upright."
        );
    }

    #[test]
    fn test_looking_away_message() {
        let v = Verdict::looking_away(pose(1.0, -40.2));
        assert_eq!(v.reason(), Some(WarningReason::LookingAway));
        assert_eq!(v.message(), "Looking too far left (40deg). Please face forward.");
    }

    #[test]
    fn test_landmarks_lost_is_no_face_with_distinct_message() {
        let lost = Verdict::landmarks_lost();
        let none = Verdict::no_face();
        assert_eq!(lost.reason(), Some(WarningReason::NoFace));
        assert_eq!(none.reason(), Some(WarningReason::NoFace));
        assert_ne!(lost.message(), none.message());
    }

    // ── Serialization ───────────────────────────────────────────────

    #[test]
    fn test_serialize_success() {
        let value = serde_json::to_value(Verdict::success(pose(0.0, 0.0))).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "message": "Face verified.",
                "angles": {"roll": 0.0, "yaw": 0.0}
            })
        );
    }

    #[test]
    fn test_serialize_warning_without_angles_omits_key() {
        let value = serde_json::to_value(Verdict::camera_blocked()).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "warning",
                "reason": "camera_blocked",
                "message": CAMERA_BLOCKED_MESSAGE
            })
        );
    }

    #[test]
    fn test_serialize_warning_with_angles() {
        let value = serde_json::to_value(Verdict::looking_away(pose(3.04, 50.06))).unwrap();
        assert_eq!(value["reason"], "looking_away");
        assert_eq!(value["angles"], json!({"roll": 3.0, "yaw": 50.1}));
    }

    #[test]
    fn test_serialize_error() {
        let v = Verdict::error("No image provided");
        assert!(v.is_error());
        assert_eq!(
            serde_json::to_value(v).unwrap(),
            json!({"status": "error", "message": "No image provided"})
        );
    }

    #[rstest]
    #[case::blocked(Verdict::camera_blocked(), "camera_blocked")]
    #[case::no_face(Verdict::no_face(), "no_face")]
    #[case::multiple(Verdict::multiple_faces(2), "multiple_faces")]
    #[case::tilted(Verdict::head_tilted(pose(30.0, 0.0)), "head_tilted")]
    #[case::away(Verdict::looking_away(pose(0.0, 40.0)), "looking_away")]
    fn test_reason_wire_names(#[case] verdict: Verdict, #[case] wire: &str) {
        assert!(!verdict.is_error());
        assert_eq!(serde_json::to_value(verdict).unwrap()["reason"], wire);
    }
}
