/// A located face in pixel coordinates of the source frame.
///
/// Verification only counts regions.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}
