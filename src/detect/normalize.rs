//! Coordinate normalization for provider payloads.
//!
//! Providers either return boxes that are already in the 0..=1000 space
//! (`box_2d = [ymin, xmin, ymax, xmax]`) or absolute pixel corners
//! (`x1, y1, x2, y2`). Both shapes end up as [`Detection`] values with a
//! [`BoundingBox`] in normalized space.
//!
//! Pixel values are scaled with `round(v / extent * 1000)` using
//! half-away-from-zero rounding, then clamped into `0..=1000`.

use serde::Deserialize;
use serde_json::Value;

use super::result::{BoundingBox, Detection, DetectionResult, NORMALIZED_MAX};

/// Item returned by the remote multimodal provider.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NormalizedItem {
    #[serde(default)]
    pub label: Option<String>,
    /// `[ymin, xmin, ymax, xmax]` in 0..=1000.
    pub box_2d: [f64; 4],
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub class_id: Option<u32>,
}

/// Prediction returned by the custom inference endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PixelPrediction {
    #[serde(default)]
    pub class_id: Option<u32>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// A single provider item in its native representation.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderItem {
    Normalized(NormalizedItem),
    PixelCorners(PixelPrediction),
}

/// Convert one provider item into a [`Detection`].
///
/// `image_width` and `image_height` are the decoded pixel dimensions of the
/// source image; they are only consulted for pixel-corner items.
pub fn normalize(item: &ProviderItem, image_width: u32, image_height: u32) -> Detection {
    match item {
        ProviderItem::Normalized(item) => {
            let [ymin, xmin, ymax, xmax] = item.box_2d;
            let bbox = BoundingBox::new(
                round_unit(ymin),
                round_unit(xmin),
                round_unit(ymax),
                round_unit(xmax),
            );
            let mut detection = Detection::new(resolve_label(item.label.as_deref()), bbox);
            if let Some(score) = item.score {
                detection = detection.with_score(score);
            }
            if let Some(class_id) = item.class_id {
                detection = detection.with_class_id(class_id);
            }
            detection
        }
        ProviderItem::PixelCorners(pred) => {
            let bbox = BoundingBox::new(
                scale_to_unit(pred.y1, image_height),
                scale_to_unit(pred.x1, image_width),
                scale_to_unit(pred.y2, image_height),
                scale_to_unit(pred.x2, image_width),
            );
            let mut detection = Detection::new(resolve_label(pred.class_name.as_deref()), bbox)
                .with_score(pred.confidence.unwrap_or(0.0));
            if let Some(class_id) = pred.class_id {
                detection = detection.with_class_id(class_id);
            }
            detection
        }
    }
}

/// Normalize a `{ "detections": [...] }` payload.
///
/// A payload without a `detections` array yields an empty result.
pub fn from_normalized_payload(payload: &Value) -> DetectionResult {
    let detections = payload_items(payload, "detections")
        .filter_map(|item| match serde_json::from_value::<NormalizedItem>(item.clone()) {
            Ok(parsed) => Some(normalize(&ProviderItem::Normalized(parsed), 1, 1)),
            Err(e) => {
                log::warn!("skipping unreadable detection item: {}", e);
                None
            }
        })
        .collect();
    DetectionResult::new(detections)
}

/// Normalize a `{ "predictions": [...] }` payload of pixel corners.
///
/// A payload without a `predictions` array yields an empty result.
pub fn from_pixel_payload(payload: &Value, image_width: u32, image_height: u32) -> DetectionResult {
    let detections = payload_items(payload, "predictions")
        .filter_map(|item| match serde_json::from_value::<PixelPrediction>(item.clone()) {
            Ok(parsed) => Some(normalize(
                &ProviderItem::PixelCorners(parsed),
                image_width,
                image_height,
            )),
            Err(e) => {
                log::warn!("skipping unreadable prediction item: {}", e);
                None
            }
        })
        .collect();
    DetectionResult::new(detections)
}

fn payload_items<'a>(payload: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    let items = payload.get(key).and_then(Value::as_array);
    if items.is_none() {
        log::warn!("unexpected provider response format: no '{}' array", key);
    }
    items.into_iter().flatten()
}

fn resolve_label(label: Option<&str>) -> &str {
    match label {
        Some(label) if !label.is_empty() => label,
        _ => Detection::FALLBACK_LABEL,
    }
}

fn round_unit(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.round() as i64
}

fn scale_to_unit(value: f64, extent: u32) -> i64 {
    if extent == 0 {
        return 0;
    }
    round_unit(value / extent as f64 * NORMALIZED_MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pixel(x1: f64, y1: f64, x2: f64, y2: f64) -> ProviderItem {
        ProviderItem::PixelCorners(PixelPrediction {
            class_id: Some(3),
            class_name: Some("car".to_string()),
            confidence: Some(0.91),
            x1,
            y1,
            x2,
            y2,
        })
    }

    #[test]
    fn pixel_corners_scale_against_image_dimensions() {
        let det = normalize(&pixel(100.0, 50.0, 300.0, 250.0), 400, 500);
        assert_eq!(det.box_2d().to_array(), [100, 250, 500, 750]);
        assert_eq!(det.label(), "car");
        assert_eq!(det.class_id(), Some(3));
        assert_eq!(det.score(), Some(0.91));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        // 1/16 * 1000 = 62.5, 3/16 * 1000 = 187.5
        let det = normalize(&pixel(1.0, 1.0, 3.0, 8.0), 16, 8);
        assert_eq!(det.box_2d().xmin(), 63);
        assert_eq!(det.box_2d().xmax(), 188);
        assert_eq!(det.box_2d().ymin(), 125);
        assert_eq!(det.box_2d().ymax(), 1000);
    }

    #[test]
    fn corners_outside_the_image_are_clamped() {
        let det = normalize(&pixel(-40.0, -1.0, 900.0, 1200.0), 400, 500);
        let bbox = det.box_2d();
        assert_eq!(bbox.to_array(), [0, 0, 1000, 1000]);
    }

    #[test]
    fn swapped_corners_still_satisfy_ordering() {
        let det = normalize(&pixel(300.0, 250.0, 100.0, 50.0), 400, 500);
        let bbox = det.box_2d();
        assert!(bbox.ymin() <= bbox.ymax());
        assert!(bbox.xmin() <= bbox.xmax());
        assert_eq!(bbox.to_array(), [100, 250, 500, 750]);
    }

    #[test]
    fn missing_class_name_and_confidence_fall_back() {
        let item = ProviderItem::PixelCorners(PixelPrediction {
            class_id: None,
            class_name: Some(String::new()),
            confidence: None,
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 10.0,
        });
        let det = normalize(&item, 100, 100);
        assert_eq!(det.label(), "Object");
        assert_eq!(det.score(), Some(0.0));
        assert_eq!(det.class_id(), None);
    }

    #[test]
    fn normalized_items_pass_through() {
        let payload = json!({
            "detections": [
                {"label": "猫", "box_2d": [10, 20, 300, 400]},
                {"label": "dog", "box_2d": [0, 0, 1000, 1000]}
            ]
        });
        let result = from_normalized_payload(&payload);
        assert_eq!(result.len(), 2);
        assert_eq!(result.detections[0].label(), "猫");
        assert_eq!(result.detections[0].box_2d().to_array(), [10, 20, 300, 400]);
        assert_eq!(result.detections[0].score(), None);
    }

    #[test]
    fn unreadable_items_are_skipped() {
        let payload = json!({
            "detections": [
                {"label": "short", "box_2d": [1, 2, 3]},
                {"label": "ok", "box_2d": [1, 2, 3, 4]}
            ]
        });
        let result = from_normalized_payload(&payload);
        assert_eq!(result.len(), 1);
        assert_eq!(result.detections[0].label(), "ok");
    }

    #[test]
    fn confidence_keeps_full_precision() {
        let payload = json!({
            "predictions": [
                {"class_id": 1, "class_name": "dog", "confidence": 0.445,
                 "x1": 0, "y1": 0, "x2": 5, "y2": 5}
            ]
        });
        let result = from_pixel_payload(&payload, 10, 10);
        let score = result.detections[0].score();
        assert_eq!(score, Some(0.445));
        assert_eq!(crate::view::overlay::score_text(score), "45%");
    }

    #[test]
    fn malformed_payloads_degrade_to_empty() {
        assert!(from_pixel_payload(&json!({"predictions": {"x1": 1}}), 10, 10).is_empty());
        assert!(from_pixel_payload(&json!("nope"), 10, 10).is_empty());
        assert!(from_normalized_payload(&json!({})).is_empty());
        assert!(from_pixel_payload(&json!({"predictions": []}), 10, 10).is_empty());
    }
}
