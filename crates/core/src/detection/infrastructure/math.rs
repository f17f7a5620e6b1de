//! Box geometry shared by the ONNX detection backends.

/// A scored candidate box in `[x1, y1, x2, y2]` pixel coordinates.
pub trait ScoredBox {
    fn bbox(&self) -> [f64; 4];
    fn score(&self) -> f64;
}

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy NMS: sort by score descending, suppress boxes overlapping a kept one.
///
/// The returned boxes are ordered by score, highest first.
pub fn nms<T: ScoredBox + Clone>(dets: &mut [T], iou_thresh: f64) -> Vec<T> {
    dets.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        let kept_box = dets[i].bbox();
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && bbox_iou(&kept_box, &dets[j].bbox()) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
