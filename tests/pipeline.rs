//! End-to-end tests: recorded provider payload → normalization → statistics
//! → visibility → overlay → HTML document.

use image::{ImageFormat, RgbImage};
use serde_json::json;
use std::io::Cursor;
use tempfile::tempdir;

use detection_viewer::detect::FixtureBackend;
use detection_viewer::view::{
    aggregate, write_document, Phase, ResultView, StatsEntry, ViewSnapshot,
};
use detection_viewer::{BackendRegistry, DetectorBackend, ImageUpload};

fn upload(width: u32, height: u32) -> ImageUpload {
    let img = RgbImage::from_pixel(width, height, image::Rgb([90, 90, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    ImageUpload::from_bytes(out.into_inner(), "scene.png").expect("decode upload")
}

#[test]
fn pixel_corner_example_normalizes_to_expected_box() {
    let mut backend = FixtureBackend::new(json!({
        "predictions": [
            {"class_id": 7, "class_name": "truck", "confidence": 0.6,
             "x1": 100, "y1": 50, "x2": 300, "y2": 250}
        ]
    }));
    let result = backend.detect(&upload(400, 500)).expect("detect");
    assert_eq!(result.detections[0].box_2d().to_array(), [100, 250, 500, 750]);
}

#[test]
fn empty_predictions_render_without_crash() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("view.html");

    let mut registry = BackendRegistry::new();
    registry.register(FixtureBackend::new(json!({ "predictions": [] })));

    let image = upload(64, 48);
    let mut view = ResultView::new();
    let token = view.select_image(image.clone(), None);
    let outcome = registry.detect(&image);
    assert!(view.complete(token, outcome));

    assert_eq!(view.phase(), &Phase::Ready);
    assert!(view.result().is_empty());
    assert!(view.stats().is_empty());
    write_document(&view.snapshot(), &out).expect("write html");

    let html = std::fs::read_to_string(&out).expect("read html");
    assert!(html.contains("total 0 &middot; visible 0"));
    assert!(!html.contains("class=\"box\""));
}

#[test]
fn toggles_drive_overlay_and_visible_count() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("view.html");
    let out_for_observer = out.clone();

    let mut backend = FixtureBackend::new(json!({
        "detections": [
            {"label": "person", "box_2d": [100, 100, 400, 300], "class_id": 0},
            {"label": "bicycle", "box_2d": [500, 100, 900, 600], "class_id": 1},
            {"label": "person", "box_2d": [120, 600, 420, 800], "class_id": 0}
        ]
    }));

    let mut view = ResultView::new();
    view.subscribe(Box::new(move |snapshot: &ViewSnapshot<'_>| {
        write_document(snapshot, &out_for_observer).expect("write html");
    }));

    let image = upload(200, 100);
    let token = view.select_image(image.clone(), None);
    view.complete(token, backend.detect(&image));

    assert_eq!(
        view.stats(),
        &[
            StatsEntry {
                label: "person".into(),
                count: 2,
            },
            StatsEntry {
                label: "bicycle".into(),
                count: 1,
            },
        ]
    );

    view.toggle("person");
    let html = std::fs::read_to_string(&out).expect("read html");
    assert!(html.contains("total 3 &middot; visible 1"));
    assert_eq!(html.matches("class=\"box\"").count(), 1);
    assert!(html.contains("data-label=\"bicycle\""));

    view.toggle("person");
    let html = std::fs::read_to_string(&out).expect("read html");
    assert!(html.contains("total 3 &middot; visible 3"));
    assert_eq!(html.matches("class=\"box\"").count(), 3);
}

#[test]
fn replacing_the_result_restores_all_classes() {
    let image = upload(10, 10);
    let mut first = FixtureBackend::new(json!({
        "detections": [{"label": "cat", "box_2d": [0, 0, 10, 10]}]
    }));
    let mut second = FixtureBackend::new(json!({
        "detections": [
            {"label": "cat", "box_2d": [0, 0, 10, 10]},
            {"label": "dog", "box_2d": [0, 0, 10, 10]}
        ]
    }));

    let mut view = ResultView::new();
    let token = view.select_image(image.clone(), None);
    view.complete(token, first.detect(&image));
    view.toggle("cat");
    assert_eq!(view.visible_detections().len(), 0);

    let token = view.select_image(image.clone(), None);
    view.complete(token, second.detect(&image));
    for entry in aggregate(&view.result().detections) {
        assert!(view.is_visible(&entry.label));
    }
    assert_eq!(view.visible_detections().len(), 2);
}

#[test]
fn recorded_response_file_replays() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("response.json");
    std::fs::write(
        &path,
        r#"{"detections": [{"label": "bird", "box_2d": [5, 5, 50, 50]}]}"#,
    )
    .expect("write fixture");

    let mut backend = FixtureBackend::from_file(&path).expect("load fixture");
    let result = backend.detect(&upload(8, 8)).expect("detect");
    assert_eq!(result.len(), 1);
    assert_eq!(result.detections[0].label(), "bird");
}
