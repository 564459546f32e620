//! Overlay geometry and class colours.
//!
//! Boxes are placed in percent of the element that wraps the displayed
//! image. Because that element scales with the image, the overlay stays
//! aligned at any display size and nothing is recomputed on resize.

use serde::Serialize;
use std::fmt;

use crate::detect::Detection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Border and label-fill colour of one class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ClassColor {
    pub border: Rgb,
    pub fill: Rgb,
}

pub const PALETTE: [ClassColor; 10] = [
    // blue
    ClassColor {
        border: Rgb(59, 130, 246),
        fill: Rgb(37, 99, 235),
    },
    // green
    ClassColor {
        border: Rgb(34, 197, 94),
        fill: Rgb(22, 163, 74),
    },
    // orange
    ClassColor {
        border: Rgb(249, 115, 22),
        fill: Rgb(234, 88, 12),
    },
    // purple
    ClassColor {
        border: Rgb(168, 85, 247),
        fill: Rgb(147, 51, 234),
    },
    // pink
    ClassColor {
        border: Rgb(236, 72, 153),
        fill: Rgb(219, 39, 119),
    },
    // yellow
    ClassColor {
        border: Rgb(234, 179, 8),
        fill: Rgb(202, 138, 4),
    },
    // sky
    ClassColor {
        border: Rgb(14, 165, 233),
        fill: Rgb(2, 132, 199),
    },
    // red
    ClassColor {
        border: Rgb(239, 68, 68),
        fill: Rgb(220, 38, 38),
    },
    // teal
    ClassColor {
        border: Rgb(20, 184, 166),
        fill: Rgb(13, 148, 136),
    },
    // stone
    ClassColor {
        border: Rgb(168, 162, 158),
        fill: Rgb(120, 113, 108),
    },
];

/// Colour for a class id; detections without one use the first entry.
pub fn color_for_class(class_id: Option<u32>) -> ClassColor {
    match class_id {
        Some(id) => PALETTE[id as usize % PALETTE.len()],
        None => PALETTE[0],
    }
}

/// Rounded percentage for a positive score, empty otherwise.
pub fn score_text(score: Option<f64>) -> String {
    match score {
        Some(score) if score > 0.0 => format!("{}%", (score * 100.0).round() as i64),
        _ => String::new(),
    }
}

/// One box positioned in percent of the image wrapper.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub color: ClassColor,
    /// Badge text; the percentage is empty when there is no positive score.
    pub label: String,
    pub score: String,
}

impl OverlayBox {
    pub fn from_detection(detection: &Detection) -> Self {
        let bbox = detection.box_2d();
        Self {
            top: bbox.ymin() as f64 / 10.0,
            left: bbox.xmin() as f64 / 10.0,
            width: bbox.width() as f64 / 10.0,
            height: bbox.height() as f64 / 10.0,
            color: color_for_class(detection.class_id()),
            label: detection.label().to_string(),
            score: score_text(detection.score()),
        }
    }
}

/// Overlay for one displayed image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overlay {
    /// Intrinsic pixel size; fixes the aspect ratio of the wrapper.
    pub image_width: u32,
    pub image_height: u32,
    pub boxes: Vec<OverlayBox>,
}

/// Lay out the visible detections over an image of the given intrinsic size.
pub fn render_overlay(image_width: u32, image_height: u32, visible: &[&Detection]) -> Overlay {
    Overlay {
        image_width,
        image_height,
        boxes: visible
            .iter()
            .map(|detection| OverlayBox::from_detection(detection))
            .collect(),
    }
}
