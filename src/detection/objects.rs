// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Prohibited object sightings

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::DetectionState;
use crate::config::DetectionConfig;
use crate::core::{Event, EventType};
use crate::inference::DetectedObject;

/// Sorted, de-duplicated suspicious labels above the confidence threshold,
/// joined with `", "`. `None` when nothing qualifies.
pub fn suspicious_labels(objects: &[DetectedObject], config: &DetectionConfig) -> Option<String> {
    let labels: BTreeSet<&str> = objects
        .iter()
        .filter(|o| o.score > config.object_confidence)
        .filter(|o| config.suspicious_objects.iter().any(|s| s == &o.label))
        .map(|o| o.label.as_str())
        .collect();

    if labels.is_empty() {
        None
    } else {
        Some(labels.into_iter().collect::<Vec<_>>().join(", "))
    }
}

/// Apply the object rule to one scan result. The caller decides whether a
/// scan is due; this records the scan time and suppresses a label set equal
/// to the previous `object-detected` event.
pub(super) fn evaluate_objects(
    state: &mut DetectionState,
    config: &DetectionConfig,
    objects: &[DetectedObject],
    now: DateTime<Utc>,
    out: &mut Vec<Event>,
) {
    state.last_object_scan_at = Some(now);

    let Some(labels) = suspicious_labels(objects, config) else {
        return;
    };
    if state.last_object_labels.as_deref() == Some(labels.as_str()) {
        return;
    }

    out.push(Event::with_detail(EventType::ObjectDetected, now, labels.clone()));
    state.last_object_labels = Some(labels);
}
