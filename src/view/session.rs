//! Result view state.
//!
//! One `ResultView` owns the current upload, its detection result and the
//! visibility set. Every transition replaces whole values and then hands
//! a fresh [`ViewSnapshot`] to the registered observers, which redraw.
//!
//! Requests are tagged with a [`RequestToken`]. Selecting a new image or
//! resetting invalidates the outstanding token, so a late completion of an
//! older request is dropped (last request wins).

use crate::detect::{Detection, DetectionResult};
use crate::upload::ImageUpload;

use super::overlay::{color_for_class, render_overlay, ClassColor, Overlay};
use super::stats::{aggregate, bar_percent, max_count, StatsEntry};
use super::visibility::VisibilitySet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No image selected.
    Idle,
    /// Waiting for the provider.
    Loading,
    /// Provider call failed; retry by uploading again.
    Failed { message: String },
    /// Detections available.
    Ready,
}

/// One row of the statistics panel.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsRow {
    pub label: String,
    pub count: usize,
    pub bar_percent: f64,
    pub visible: bool,
    pub color: ClassColor,
}

/// Everything needed to paint the view once.
#[derive(Clone, Debug)]
pub struct ViewSnapshot<'a> {
    pub phase: &'a Phase,
    pub image: Option<&'a ImageUpload>,
    pub model_name: Option<&'a str>,
    pub rows: Vec<StatsRow>,
    pub overlay: Option<Overlay>,
    pub total: usize,
    pub visible: usize,
}

pub type Observer = Box<dyn FnMut(&ViewSnapshot<'_>) + Send>;

pub struct ResultView {
    phase: Phase,
    image: Option<ImageUpload>,
    model_name: Option<String>,
    result: DetectionResult,
    stats: Vec<StatsEntry>,
    visibility: VisibilitySet,
    next_token: u64,
    pending: Option<RequestToken>,
    observers: Vec<Observer>,
}

impl ResultView {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            image: None,
            model_name: None,
            result: DetectionResult::empty(),
            stats: Vec::new(),
            visibility: VisibilitySet::default(),
            next_token: 0,
            pending: None,
            observers: Vec::new(),
        }
    }

    /// Register a callback run after every state transition.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Start a detection for a new image. Any outstanding request is
    /// invalidated.
    pub fn select_image(&mut self, image: ImageUpload, model_name: Option<String>) -> RequestToken {
        let token = RequestToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(token);
        self.image = Some(image);
        self.model_name = model_name;
        self.replace_result(DetectionResult::empty());
        self.phase = Phase::Loading;
        self.notify();
        token
    }

    /// Apply the outcome of a request. Returns false when the request was
    /// superseded and the outcome was discarded.
    pub fn complete(&mut self, token: RequestToken, outcome: anyhow::Result<DetectionResult>) -> bool {
        if self.pending != Some(token) {
            log::debug!("discarding stale detection result {:?}", token);
            return false;
        }
        self.pending = None;
        match outcome {
            Ok(result) => {
                self.replace_result(result);
                self.phase = Phase::Ready;
            }
            Err(err) => {
                log::error!("detection error: {:#}", err);
                self.replace_result(DetectionResult::empty());
                self.phase = Phase::Failed {
                    message: err.to_string(),
                };
            }
        }
        self.notify();
        true
    }

    /// Record a selection that never reached a provider, e.g. an image
    /// that could not be decoded. Any outstanding request is invalidated.
    pub fn fail_selection(&mut self, message: impl Into<String>) {
        self.pending = None;
        self.image = None;
        self.model_name = None;
        self.replace_result(DetectionResult::empty());
        self.phase = Phase::Failed {
            message: message.into(),
        };
        self.notify();
    }

    /// Flip visibility of one class.
    pub fn toggle(&mut self, label: &str) {
        self.visibility.toggle(label);
        self.notify();
    }

    /// Back to the initial state ("new detection").
    pub fn reset(&mut self) {
        self.pending = None;
        self.image = None;
        self.model_name = None;
        self.replace_result(DetectionResult::empty());
        self.phase = Phase::Idle;
        self.notify();
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    pub fn result(&self) -> &DetectionResult {
        &self.result
    }

    pub fn stats(&self) -> &[StatsEntry] {
        &self.stats
    }

    pub fn is_visible(&self, label: &str) -> bool {
        self.visibility.is_visible(label)
    }

    pub fn visible_detections(&self) -> Vec<&Detection> {
        self.visibility.filter_visible(&self.result.detections)
    }

    pub fn snapshot(&self) -> ViewSnapshot<'_> {
        let max = max_count(&self.stats);
        let rows = self
            .stats
            .iter()
            .map(|entry| StatsRow {
                label: entry.label.clone(),
                count: entry.count,
                bar_percent: bar_percent(entry, max),
                visible: self.visibility.is_visible(&entry.label),
                color: color_for_class(self.class_id_for(&entry.label)),
            })
            .collect();
        let visible = self.visible_detections();
        let overlay = match (&self.phase, &self.image) {
            (Phase::Ready, Some(image)) => {
                Some(render_overlay(image.width(), image.height(), &visible))
            }
            _ => None,
        };
        ViewSnapshot {
            phase: &self.phase,
            image: self.image.as_ref(),
            model_name: self.model_name.as_deref(),
            rows,
            overlay,
            total: self.result.len(),
            visible: visible.len(),
        }
    }

    fn class_id_for(&self, label: &str) -> Option<u32> {
        self.result
            .detections
            .iter()
            .find(|d| d.label() == label)
            .and_then(Detection::class_id)
    }

    fn replace_result(&mut self, result: DetectionResult) {
        self.stats = aggregate(&result.detections);
        self.visibility = VisibilitySet::all_visible(&self.stats);
        self.result = result;
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let mut observers = std::mem::take(&mut self.observers);
        {
            let snapshot = self.snapshot();
            for observer in observers.iter_mut() {
                observer(&snapshot);
            }
        }
        observers.append(&mut self.observers);
        self.observers = observers;
    }
}

impl Default for ResultView {
    fn default() -> Self {
        Self::new()
    }
}
