/// YOLO-pose face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing. Serves
/// as both a [`FaceLocator`] (every surviving box) and a [`LandmarkExtractor`]
/// (5 keypoints of the highest-confidence box).
use std::path::Path;

use crate::detection::domain::face_landmarks::{FaceLandmarkSet, LandmarkLayout};
use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::math::{nms, ScoredBox};

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

const NUM_KEYPOINTS: usize = 5;

/// Number of keypoint values per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = NUM_KEYPOINTS * 3;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    // [N, C, H, W]; H and W are equal for square input
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded YOLO face model {} (input {input_size}px)",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }

    /// Runs inference and returns NMS-filtered detections, highest score first.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let (input_tensor, transform) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut raw_dets = parse_output(data, tensor.shape(), self.confidence, transform)?;
        Ok(nms(&mut raw_dets, NMS_IOU_THRESH))
    }
}

impl FaceLocator for OnnxYoloDetector {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let dets = self.detect(frame)?;
        Ok(dets
            .iter()
            .map(|d| d.to_region(frame.width(), frame.height()))
            .collect())
    }
}

impl LandmarkExtractor for OnnxYoloDetector {
    fn extract(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<FaceLandmarkSet>, Box<dyn std::error::Error>> {
        let dets = self.detect(frame)?;
        Ok(dets
            .first()
            .and_then(|d| d.landmarks(frame.width(), frame.height())))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Maps letterbox pixels back to source frame pixels.
#[derive(Clone, Copy, Debug)]
struct LetterboxTransform {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// Letterbox-resize a frame to `target_size` × `target_size` as an NCHW float32 tensor.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, LetterboxTransform) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, the YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        LetterboxTransform {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    /// `(x, y, confidence)` per keypoint, in source frame pixels.
    keypoints: Option<[(f64, f64, f64); NUM_KEYPOINTS]>,
}

impl ScoredBox for RawDetection {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    fn score(&self) -> f64 {
        self.confidence
    }
}

impl RawDetection {
    fn to_region(&self, fw: u32, fh: u32) -> Region {
        let x1 = self.x1.clamp(0.0, fw as f64);
        let y1 = self.y1.clamp(0.0, fh as f64);
        let x2 = self.x2.clamp(0.0, fw as f64);
        let y2 = self.y2.clamp(0.0, fh as f64);
        Region {
            x: x1 as i32,
            y: y1 as i32,
            width: (x2 - x1) as i32,
            height: (y2 - y1) as i32,
            confidence: self.confidence,
        }
    }

    /// Normalized 5-point landmarks, or `None` when the eyes or nose are not visible.
    fn landmarks(&self, fw: u32, fh: u32) -> Option<FaceLandmarkSet> {
        let keypoints = self.keypoints?;
        let layout = LandmarkLayout::FIVE_POINT;
        let required = [layout.left_eye, layout.right_eye, layout.nose_tip];
        if required
            .iter()
            .any(|&i| keypoints[i].2 < KEYPOINT_CONF_THRESH)
        {
            return None;
        }

        let points = keypoints
            .iter()
            .map(|&(x, y, _)| (x / fw as f64, y / fh as f64))
            .collect();
        FaceLandmarkSet::new(points, layout)
    }
}

/// Decodes the raw YOLO output tensor into frame-space detections above `confidence`.
///
/// Accepts both `[1, features, detections]` and `[1, detections, features]`.
/// Rows are `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]` in letterbox pixels.
fn parse_output(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    transform: LetterboxTransform,
) -> Result<Vec<RawDetection>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}"));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "YOLO output has {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        ));
    }

    let scale = transform.scale;
    let pad_x = transform.pad_x as f64;
    let pad_y = transform.pad_y as f64;
    let value = |det: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[idx] as f64
    };

    let mut raw_dets = Vec::new();
    if num_feats < 5 {
        return Ok(raw_dets);
    }

    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < confidence {
            continue;
        }

        let cx = value(i, 0);
        let cy = value(i, 1);
        let w = value(i, 2);
        let h = value(i, 3);

        let keypoints = if num_feats >= 5 + NUM_KEYPOINT_VALUES {
            let mut pts = [(0.0, 0.0, 0.0); NUM_KEYPOINTS];
            for (k, pt) in pts.iter_mut().enumerate() {
                let base = 5 + k * 3;
                *pt = (
                    (value(i, base) - pad_x) / scale,
                    (value(i, base + 1) - pad_y) / scale,
                    value(i, base + 2),
                );
            }
            Some(pts)
        } else {
            None
        };

        raw_dets.push(RawDetection {
            x1: ((cx - w / 2.0) - pad_x) / scale,
            y1: ((cy - h / 2.0) - pad_y) / scale,
            x2: ((cx + w / 2.0) - pad_x) / scale,
            y2: ((cy + h / 2.0) - pad_y) / scale,
            confidence: conf,
            keypoints,
        });
    }

    Ok(raw_dets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
