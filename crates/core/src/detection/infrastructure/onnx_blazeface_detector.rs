/// BlazeFace face locator using ONNX Runtime via `ort`.
///
/// A lightweight short-range detector that provides bounding boxes only.
/// Suitable for counting faces when landmarks come from another model.
use std::path::Path;

use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::math::{nms, sigmoid, ScoredBox};

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: 4 box deltas + 6 keypoints × 2.
const REGRESSOR_STRIDE: usize = 16;

/// BlazeFace face locator backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        log::info!("Loaded BlazeFace model {}", model_path.display());
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceLocator for OnnxBlazefaceDetector {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let input_tensor = preprocess(frame, INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut raw_dets = decode_boxes(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence,
            frame.width(),
            frame.height(),
        );

        Ok(nms(&mut raw_dets, NMS_IOU_THRESH)
            .iter()
            .map(RawDet::to_region)
            .collect())
    }
}

/// Decodes anchor-relative boxes scoring at least `confidence` into frame pixels.
fn decode_boxes(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f64,
    fw: u32,
    fh: u32,
) -> Vec<RawDet> {
    let mut raw_dets = Vec::new();
    let num_anchors = anchors.len().min(NUM_ANCHORS);

    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if (score as f64) < confidence {
            continue;
        }

        let anchor = &anchors[i];
        let reg_offset = i * REGRESSOR_STRIDE;
        if reg_offset + 4 > reg_data.len() {
            break;
        }

        let cx = anchor[0] + reg_data[reg_offset] / INPUT_SIZE as f32;
        let cy = anchor[1] + reg_data[reg_offset + 1] / INPUT_SIZE as f32;
        let w = reg_data[reg_offset + 2] / INPUT_SIZE as f32;
        let h = reg_data[reg_offset + 3] / INPUT_SIZE as f32;

        raw_dets.push(RawDet {
            x1: (((cx - w / 2.0) * fw as f32).max(0.0)) as f64,
            y1: (((cy - h / 2.0) * fh as f32).max(0.0)) as f64,
            x2: (((cx + w / 2.0) * fw as f32).min(fw as f32)) as f64,
            y2: (((cy + h / 2.0) * fh as f32).min(fh as f32)) as f64,
            score: score as f64,
        });
    }

    raw_dets
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Anchor generation (BlazeFace short-range)
// ---------------------------------------------------------------------------

/// Generate BlazeFace anchors for the short-range model.
///
/// The short-range model uses two feature map sizes: 16×16 and 8×8,
/// with 2 and 6 anchors per cell respectively.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

// ---------------------------------------------------------------------------
// Detections
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDet {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    score: f64,
}

impl ScoredBox for RawDet {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    fn score(&self) -> f64 {
        self.score
    }
}

impl RawDet {
    /// Corners are already clamped to the frame during decoding.
    fn to_region(&self) -> Region {
        Region {
            x: self.x1 as i32,
            y: self.y1 as i32,
            width: (self.x2 - self.x1) as i32,
            height: (self.y2 - self.y1) as i32,
            confidence: self.score,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Regressor and score buffers where only `hot` anchors carry a face.
    fn outputs(hot: &[(usize, [f32; 4], f32)]) -> (Vec<f32>, Vec<f32>) {
        let mut reg = vec![0.0f32; NUM_ANCHORS * REGRESSOR_STRIDE];
        let mut scores = vec![-10.0f32; NUM_ANCHORS];
        for &(i, deltas, logit) in hot {
            reg[i * REGRESSOR_STRIDE..i * REGRESSOR_STRIDE + 4].copy_from_slice(&deltas);
            scores[i] = logit;
        }
        (reg, scores)
    }

    #[test]
    fn test_preprocess_shape() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3);
        let tensor = preprocess(&frame, 128);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
    }

    #[test]
    fn test_preprocess_normalized() {
        let frame = Frame::new(vec![255u8; 50 * 50 * 3], 50, 50, 3);
        let tensor = preprocess(&frame, 128);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_generate_anchors_count() {
        // 16×16 grid × 2 anchors + 8×8 grid × 6 anchors = 512 + 384 = 896
        assert_eq!(generate_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in &generate_anchors() {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_decode_boxes_skips_low_scores() {
        let anchors = generate_anchors();
        let (reg, scores) = outputs(&[]);
        assert!(decode_boxes(&reg, &scores, &anchors, 0.5, 640, 480).is_empty());
    }

    #[test]
    fn test_decode_boxes_scales_to_frame() {
        let anchors = generate_anchors();
        // Half the input size, centered on anchor 0 at (1/32, 1/32)
        let (reg, scores) = outputs(&[(0, [0.0, 0.0, 64.0, 64.0], 5.0)]);
        let dets = decode_boxes(&reg, &scores, &anchors, 0.5, 256, 256);

        assert_eq!(dets.len(), 1);
        // Left edge clamps at 0; right edge (1/32 + 1/4) * 256 = 72
        assert_relative_eq!(dets[0].x1, 0.0);
        assert_relative_eq!(dets[0].x2, 72.0, epsilon = 1e-3);
        assert!(dets[0].score > 0.99);
    }

    #[test]
    fn test_two_separate_faces_survive_nms() {
        let anchors = generate_anchors();
        // Anchor 0 is top-left, the last anchor bottom-right
        let (reg, scores) = outputs(&[
            (0, [0.0, 0.0, 16.0, 16.0], 4.0),
            (NUM_ANCHORS - 1, [0.0, 0.0, 16.0, 16.0], 3.0),
        ]);
        let mut dets = decode_boxes(&reg, &scores, &anchors, 0.5, 640, 480);
        let kept = nms(&mut dets, NMS_IOU_THRESH);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_duplicate_anchor_hits_collapse() {
        let anchors = generate_anchors();
        // Anchors 0 and 1 share a grid cell
        let (reg, scores) = outputs(&[
            (0, [0.0, 0.0, 32.0, 32.0], 4.0),
            (1, [0.0, 0.0, 32.0, 32.0], 3.0),
        ]);
        let mut dets = decode_boxes(&reg, &scores, &anchors, 0.5, 640, 480);
        assert_eq!(dets.len(), 2);
        assert_eq!(nms(&mut dets, NMS_IOU_THRESH).len(), 1);
    }

    #[test]
    fn test_to_region_carries_score() {
        let det = RawDet {
            x1: 10.0,
            y1: 20.0,
            x2: 60.0,
            y2: 90.0,
            score: 0.75,
        };
        let r = det.to_region();
        assert_eq!((r.x, r.y, r.width, r.height), (10, 20, 50, 70));
        assert_relative_eq!(r.confidence, 0.75);
    }
}
