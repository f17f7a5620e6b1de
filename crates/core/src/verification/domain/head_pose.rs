//! Head pose from three facial landmarks.
//!
//! Roll is the tilt of the eye line from horizontal. Yaw is a linear proxy:
//! nose offset from the eye midpoint relative to the outer eye-corner span,
//! scaled so a nose level with either eye corner reads as 45 degrees. It is
//! not a projective angle. Layouts that place eye points elsewhere convert
//! their span to a corner span through `LandmarkLayout::eye_span_scale`.

use crate::detection::domain::face_landmarks::{to_pixels, FaceLandmarkSet};

/// Scale applied to the normalized nose offset to express yaw in degrees.
const YAW_SCALE_DEG: f64 = 90.0;

/// Head orientation in degrees, unrounded.
///
/// Positive roll means the right eye sits lower than the left in the image.
/// Negative yaw means the nose is left of the eye midpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadPose {
    pub roll_deg: f64,
    pub yaw_deg: f64,
}

pub fn estimate_pose(landmarks: &FaceLandmarkSet, width: u32, height: u32) -> HeadPose {
    let nose = to_pixels(landmarks.nose_tip(), width, height);
    let left_eye = to_pixels(landmarks.left_eye(), width, height);
    let right_eye = to_pixels(landmarks.right_eye(), width, height);

    let dy = right_eye.1 - left_eye.1;
    let dx = right_eye.0 - left_eye.0;
    let roll_deg = dy.atan2(dx).to_degrees();

    let eye_mid_x = (left_eye.0 + right_eye.0) / 2.0;
    let eye_dist = (right_eye.0 - left_eye.0).abs() * landmarks.layout().eye_span_scale;
    let yaw_deg = if eye_dist > 0.0 {
        (nose.0 - eye_mid_x) / eye_dist * YAW_SCALE_DEG
    } else {
        0.0
    };

    HeadPose { roll_deg, yaw_deg }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::LandmarkLayout;
    use crate::verification::domain::policy::VerificationPolicy;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// 5-point ordering with eye corners instead of centres.
    const CORNERS: LandmarkLayout = LandmarkLayout {
        eye_span_scale: 1.0,
        ..LandmarkLayout::FIVE_POINT
    };

    /// Builds a set from normalized eye-corner and nose positions.
    fn landmarks(left_eye: (f64, f64), right_eye: (f64, f64), nose: (f64, f64)) -> FaceLandmarkSet {
        FaceLandmarkSet::new(
            vec![left_eye, right_eye, nose, (0.45, 0.7), (0.55, 0.7)],
            CORNERS,
        )
        .unwrap()
    }

    #[test]
    fn test_frontal_face_is_zero() {
        let lm = landmarks((0.4, 0.4), (0.6, 0.4), (0.5, 0.5));
        let pose = estimate_pose(&lm, 640, 480);
        assert_relative_eq!(pose.roll_deg, 0.0);
        assert_relative_eq!(pose.yaw_deg, 0.0);
    }

    #[test]
    fn test_roll_positive_when_right_eye_lower() {
        // 100 px apart horizontally, right eye 100 px lower: 45 degrees
        let lm = landmarks((0.1, 0.1), (0.2, 0.2), (0.15, 0.3));
        let pose = estimate_pose(&lm, 1000, 1000);
        assert_relative_eq!(pose.roll_deg, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_roll_negative_when_right_eye_higher() {
        let lm = landmarks((0.1, 0.2), (0.2, 0.1), (0.15, 0.3));
        let pose = estimate_pose(&lm, 1000, 1000);
        assert_relative_eq!(pose.roll_deg, -45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_roll_uses_pixel_aspect() {
        // Normalized dx = dy = 0.1, but the frame is twice as wide as tall:
        // dx = 200 px, dy = 100 px
        let lm = landmarks((0.4, 0.4), (0.5, 0.5), (0.45, 0.6));
        let pose = estimate_pose(&lm, 2000, 1000);
        assert_relative_eq!(pose.roll_deg, 0.5f64.atan().to_degrees(), epsilon = 1e-9);
    }

    #[rstest]
    #[case::nose_at_left_eye(0.4, -45.0)]
    #[case::nose_at_right_eye(0.6, 45.0)]
    #[case::nose_left_of_midpoint(0.45, -22.5)]
    #[case::nose_beyond_right_eye(0.7, 90.0)]
    fn test_yaw_linear_in_nose_offset(#[case] nose_x: f64, #[case] expected: f64) {
        let lm = landmarks((0.4, 0.4), (0.6, 0.4), (nose_x, 0.5));
        let pose = estimate_pose(&lm, 1000, 1000);
        assert_relative_eq!(pose.yaw_deg, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_uses_absolute_eye_distance() {
        // Eyes swapped horizontally: eye_dist stays positive
        let lm = landmarks((0.6, 0.4), (0.4, 0.4), (0.6, 0.5));
        let pose = estimate_pose(&lm, 1000, 1000);
        assert_relative_eq!(pose.yaw_deg, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_eye_distance_yaw_is_exactly_zero() {
        let lm = landmarks((0.5, 0.3), (0.5, 0.4), (0.9, 0.5));
        let pose = estimate_pose(&lm, 640, 480);
        assert_eq!(pose.yaw_deg, 0.0);
        assert!(pose.roll_deg.is_finite());
    }

    #[test]
    fn test_deterministic_across_calls() {
        let lm = landmarks((0.41, 0.37), (0.58, 0.43), (0.52, 0.55));
        let first = estimate_pose(&lm, 1280, 720);
        for _ in 0..10 {
            let again = estimate_pose(&lm, 1280, 720);
            assert_eq!(again.roll_deg.to_bits(), first.roll_deg.to_bits());
            assert_eq!(again.yaw_deg.to_bits(), first.yaw_deg.to_bits());
        }
    }

    #[test]
    fn test_face_mesh_layout() {
        let mut pts = vec![(0.0, 0.0); 468];
        pts[33] = (0.4, 0.4);
        pts[263] = (0.6, 0.4);
        pts[1] = (0.6, 0.5);
        let lm = FaceLandmarkSet::new(pts, LandmarkLayout::FACE_MESH).unwrap();
        let pose = estimate_pose(&lm, 1000, 1000);
        assert_relative_eq!(pose.roll_deg, 0.0);
        assert_relative_eq!(pose.yaw_deg, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_eye_centres_and_corners_give_same_yaw() {
        // Same head, 1000 px wide frame: corners 90 px apart, centres 63 px
        // apart, nose 20 px right of the midpoint
        let mut mesh = vec![(0.0, 0.0); 468];
        mesh[33] = (0.455, 0.4);
        mesh[263] = (0.545, 0.4);
        mesh[1] = (0.52, 0.5);
        let corners = FaceLandmarkSet::new(mesh, LandmarkLayout::FACE_MESH).unwrap();
        let centres = FaceLandmarkSet::new(
            vec![(0.4685, 0.4), (0.5315, 0.4), (0.52, 0.5), (0.47, 0.6), (0.53, 0.6)],
            LandmarkLayout::FIVE_POINT,
        )
        .unwrap();

        let from_corners = estimate_pose(&corners, 1000, 1000);
        let from_centres = estimate_pose(&centres, 1000, 1000);
        assert_relative_eq!(from_corners.yaw_deg, 20.0, epsilon = 1e-9);
        assert_relative_eq!(from_centres.yaw_deg, from_corners.yaw_deg, epsilon = 1e-9);
        assert_relative_eq!(from_centres.roll_deg, 0.0);
    }

    #[test]
    fn test_default_yaw_limit_is_in_corner_units() {
        // A ~26deg turn on corners must not trip the 35deg limit when the
        // extractor reports eye centres
        let centres = FaceLandmarkSet::new(
            vec![(0.4685, 0.4), (0.5315, 0.4), (0.526, 0.5), (0.47, 0.6), (0.53, 0.6)],
            LandmarkLayout::FIVE_POINT,
        )
        .unwrap();
        let pose = estimate_pose(&centres, 1000, 1000);
        assert_relative_eq!(pose.yaw_deg, 26.0, epsilon = 1e-9);
        assert!(!VerificationPolicy::default().is_looking_away(pose.yaw_deg));
    }
}
