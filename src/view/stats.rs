use serde::Serialize;
use std::collections::HashMap;

use crate::detect::Detection;

/// Number of detections sharing one label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatsEntry {
    pub label: String,
    pub count: usize,
}

/// Group detections by exact label, in order of first occurrence.
///
/// Labels are compared byte-for-byte: no case folding, no trimming.
pub fn aggregate(detections: &[Detection]) -> Vec<StatsEntry> {
    let mut entries: Vec<StatsEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for detection in detections {
        match index.get(detection.label()) {
            Some(&slot) => entries[slot].count += 1,
            None => {
                index.insert(detection.label(), entries.len());
                entries.push(StatsEntry {
                    label: detection.label().to_string(),
                    count: 1,
                });
            }
        }
    }
    entries
}

/// Largest count across entries, never below 1.
pub fn max_count(entries: &[StatsEntry]) -> usize {
    entries.iter().map(|e| e.count).max().unwrap_or(0).max(1)
}

/// Bar width of an entry in percent of the largest entry.
pub fn bar_percent(entry: &StatsEntry, max_count: usize) -> f64 {
    entry.count as f64 / max_count.max(1) as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn dets(labels: &[&str]) -> Vec<Detection> {
        labels
            .iter()
            .map(|l| Detection::new(*l, BoundingBox::new(0, 0, 10, 10)))
            .collect()
    }

    #[test]
    fn first_occurrence_order() {
        let stats = aggregate(&dets(&["A", "B", "A"]));
        assert_eq!(
            stats,
            vec![
                StatsEntry {
                    label: "A".into(),
                    count: 2,
                },
                StatsEntry {
                    label: "B".into(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn counts_sum_to_detection_count() {
        let input = dets(&["car", "Car", "car ", "person", "car", "person", "dog"]);
        let stats = aggregate(&input);
        assert_eq!(stats.iter().map(|e| e.count).sum::<usize>(), input.len());
        assert_eq!(stats.len(), 5);
        for det in &input {
            assert_eq!(stats.iter().filter(|e| e.label == det.label()).count(), 1);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let input = dets(&["z", "a", "m", "a", "z"]);
        assert_eq!(aggregate(&input), aggregate(&input));
    }

    #[test]
    fn empty_input_has_no_entries_and_safe_max() {
        let stats = aggregate(&[]);
        assert!(stats.is_empty());
        assert_eq!(max_count(&stats), 1);
    }

    #[test]
    fn bars_are_proportional_to_largest() {
        let stats = aggregate(&dets(&["a", "a", "a", "a", "b"]));
        let max = max_count(&stats);
        assert_eq!(bar_percent(&stats[0], max), 100.0);
        assert_eq!(bar_percent(&stats[1], max), 25.0);
    }
}
