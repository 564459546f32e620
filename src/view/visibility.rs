use std::collections::HashSet;

use crate::detect::Detection;

use super::stats::StatsEntry;

/// Set of class labels currently shown.
///
/// Filtering asks whether each detection's own label is a member, so
/// labels left over from an earlier result never affect what is shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    visible: HashSet<String>,
}

impl VisibilitySet {
    /// Everything in `stats` visible.
    pub fn all_visible(stats: &[StatsEntry]) -> Self {
        Self {
            visible: stats.iter().map(|entry| entry.label.clone()).collect(),
        }
    }

    /// Flip membership of `label`.
    pub fn toggle(&mut self, label: &str) {
        if !self.visible.remove(label) {
            self.visible.insert(label.to_string());
        }
    }

    pub fn is_visible(&self, label: &str) -> bool {
        self.visible.contains(label)
    }

    /// Visible detections, in their original relative order.
    pub fn filter_visible<'a>(&self, detections: &'a [Detection]) -> Vec<&'a Detection> {
        detections
            .iter()
            .filter(|detection| self.is_visible(detection.label()))
            .collect()
    }
}
