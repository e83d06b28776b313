// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Face presence: count transitions and absence episodes

use chrono::{DateTime, Duration, Utc};

use super::DetectionState;
use crate::config::DetectionConfig;
use crate::core::{Event, EventType};

pub const ABSENCE_DETAIL: &str = "No face for >10s";

/// Apply the face-count transition and absence rules for one evaluated frame.
///
/// Transitions are edge-triggered against the previous evaluated count.
pub(super) fn evaluate_presence(
    state: &mut DetectionState,
    config: &DetectionConfig,
    count: usize,
    now: DateTime<Utc>,
    out: &mut Vec<Event>,
) {
    let prev = state.face_count;

    if prev == 0 && count >= 1 {
        out.push(Event::new(EventType::FaceFound, now));
    }
    if prev <= 1 && count > 1 {
        out.push(Event::new(EventType::MultipleFaces, now));
    }
    state.face_count = count;

    if count >= 1 {
        state.last_face_seen_at = now;
        state.no_face_logged = false;
        return;
    }

    let elapsed = now - state.last_face_seen_at;
    let threshold = Duration::milliseconds(config.absence_threshold_ms as i64);
    if elapsed > threshold && !state.no_face_logged {
        out.push(Event::with_detail(EventType::Absence10s, now, ABSENCE_DETAIL));
        state.no_face_logged = true;
    }
}
