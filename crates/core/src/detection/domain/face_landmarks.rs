//! Normalized facial landmarks and the index layouts that name them.
//!
//! Only three points feed head pose: the nose tip and one point per eye.
//! Which eye point depends on the layout: the face mesh names the outer eye
//! corners, the 5-point layout the eye centres. "Left" and "right" follow
//! image coordinates, so in a frontal view the left eye has the smaller x.

/// Outer eye-corner span over eye-centre span on an average adult face
/// (about 90 mm against 63 mm).
pub const CORNER_TO_CENTRE_SPAN: f64 = 90.0 / 63.0;

/// Indices of the landmarks the pose estimator reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkLayout {
    pub nose_tip: usize,
    pub left_eye: usize,
    pub right_eye: usize,
    /// Converts the measured eye span into an outer-corner span, so yaw
    /// reads the same whichever eye points the layout provides.
    pub eye_span_scale: f64,
}

impl LandmarkLayout {
    /// 5-point layout: `[left_eye, right_eye, nose, left_mouth, right_mouth]`,
    /// with eye centres.
    pub const FIVE_POINT: LandmarkLayout = LandmarkLayout {
        nose_tip: 2,
        left_eye: 0,
        right_eye: 1,
        eye_span_scale: CORNER_TO_CENTRE_SPAN,
    };

    /// 468-point face mesh layout, with outer eye corners.
    pub const FACE_MESH: LandmarkLayout = LandmarkLayout {
        nose_tip: 1,
        left_eye: 33,
        right_eye: 263,
        eye_span_scale: 1.0,
    };

    fn max_index(&self) -> usize {
        self.nose_tip.max(self.left_eye).max(self.right_eye)
    }
}

/// Landmarks of one face, each `(x, y)` normalized to `[0, 1]` of the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarkSet {
    points: Vec<(f64, f64)>,
    layout: LandmarkLayout,
}

impl FaceLandmarkSet {
    /// Returns `None` when `points` lacks any index named by `layout`.
    pub fn new(points: Vec<(f64, f64)>, layout: LandmarkLayout) -> Option<Self> {
        if points.len() <= layout.max_index() {
            return None;
        }
        Some(Self { points, layout })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn layout(&self) -> LandmarkLayout {
        self.layout
    }

    pub fn nose_tip(&self) -> (f64, f64) {
        self.points[self.layout.nose_tip]
    }

    pub fn left_eye(&self) -> (f64, f64) {
        self.points[self.layout.left_eye]
    }

    pub fn right_eye(&self) -> (f64, f64) {
        self.points[self.layout.right_eye]
    }
}

/// Scales a normalized point to pixel coordinates.
pub fn to_pixels(point: (f64, f64), width: u32, height: u32) -> (f64, f64) {
    (point.0 * width as f64, point.1 * height as f64)
}
