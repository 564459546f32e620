//! Detection Viewer
//!
//! This crate turns object-detection provider responses into an
//! interactive result view: labeled boxes over the uploaded image, per
//! class statistics and per class visibility toggles.
//!
//! # Pipeline
//!
//! raw provider response → [`detect::normalize`] → [`DetectionResult`]
//! → [`view::aggregate`] (stats) + [`VisibilitySet`] (active classes)
//! → [`view::render_overlay`] (visible subset) → [`view::render_document`].
//!
//! # Invariants
//!
//! 1. **One coordinate system**: every box is `[ymin, xmin, ymax, xmax]`
//!    in `0..=1000`, with `ymin <= ymax` and `xmin <= xmax`.
//! 2. **Stable statistics**: counts are grouped by exact label in order of
//!    first occurrence and always sum to the number of detections.
//! 3. **Consistent filtering**: the overlay and the "visible" count come
//!    from the same visibility set; a new result starts all visible.
//! 4. **Boundary failures only**: normalization, aggregation, filtering and
//!    overlay layout are total; only provider calls and image decoding fail.
//!
//! # Module Structure
//!
//! - `detect`: result types, normalization, provider backends, registry
//! - `view`: statistics, visibility, overlay geometry, session state, HTML
//! - `upload`: decoded image uploads
//! - `models`: model listing for the custom endpoint
//! - `config`: runtime configuration
//! - `ui`: terminal loading indicator

pub mod config;
pub mod detect;
pub mod models;
pub mod ui;
pub mod upload;
pub mod view;

pub use config::DetectConfig;
pub use detect::{
    BackendRegistry, BoundingBox, Detection, DetectionCapability, DetectionResult,
    DetectorBackend,
};
pub use upload::ImageUpload;
pub use view::{Phase, ResultView, StatsEntry, VisibilitySet};
