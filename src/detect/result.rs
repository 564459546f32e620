use serde::Serialize;

/// Upper bound of the normalized coordinate space.
pub const NORMALIZED_MAX: u16 = 1000;

/// Axis-aligned box in normalized coordinates `[ymin, xmin, ymax, xmax]`.
///
/// Every value lies in `0..=1000` and is a fraction of the image height
/// (y) or width (x) scaled by 1000. Construction clamps and orders the
/// corners, so `ymin <= ymax` and `xmin <= xmax` hold for every value of
/// this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "[u16; 4]")]
pub struct BoundingBox {
    ymin: u16,
    xmin: u16,
    ymax: u16,
    xmax: u16,
}

impl BoundingBox {
    pub fn new(ymin: i64, xmin: i64, ymax: i64, xmax: i64) -> Self {
        let (ymin, ymax) = ordered(clamp_unit(ymin), clamp_unit(ymax));
        let (xmin, xmax) = ordered(clamp_unit(xmin), clamp_unit(xmax));
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    pub fn ymin(&self) -> u16 {
        self.ymin
    }

    pub fn xmin(&self) -> u16 {
        self.xmin
    }

    pub fn ymax(&self) -> u16 {
        self.ymax
    }

    pub fn xmax(&self) -> u16 {
        self.xmax
    }

    pub fn height(&self) -> u16 {
        self.ymax - self.ymin
    }

    pub fn width(&self) -> u16 {
        self.xmax - self.xmin
    }

    pub fn to_array(self) -> [u16; 4] {
        [self.ymin, self.xmin, self.ymax, self.xmax]
    }
}

impl From<BoundingBox> for [u16; 4] {
    fn from(value: BoundingBox) -> Self {
        value.to_array()
    }
}

fn clamp_unit(value: i64) -> u16 {
    value.clamp(0, NORMALIZED_MAX as i64) as u16
}

fn ordered(a: u16, b: u16) -> (u16, u16) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One recognized object instance.
///
/// Produced by normalization and never mutated afterwards; the fields are
/// only reachable through accessors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    label: String,
    box_2d: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_id: Option<u32>,
}

impl Detection {
    /// Placeholder used when a provider omits the class name.
    pub const FALLBACK_LABEL: &'static str = "Object";

    pub fn new(label: impl Into<String>, box_2d: BoundingBox) -> Self {
        let label = label.into();
        let label = if label.is_empty() {
            Self::FALLBACK_LABEL.to_string()
        } else {
            label
        };
        Self {
            label,
            box_2d,
            score: None,
            class_id: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_class_id(mut self, class_id: u32) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn box_2d(&self) -> BoundingBox {
        self.box_2d
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn class_id(&self) -> Option<u32> {
        self.class_id
    }
}

/// Normalized output of one successful provider call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
