// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Gaze diversion from eye landmarks with EMA smoothing and hysteresis

use chrono::{DateTime, Duration, Utc};

use super::DetectionState;
use crate::config::DetectionConfig;
use crate::core::{Event, EventType};
use crate::inference::FaceRegion;

/// Horizontal offset of the eye midpoint from the box centre, as a fraction
/// of box width. Roughly `[-0.5, 0.5]`; zero when eye landmarks are missing.
pub fn offset_fraction(face: &FaceRegion) -> f64 {
    let width = face.width().max(1.0);
    let center = face.center_x();
    let eyes = face.eye_center_x().unwrap_or(center);
    (eyes - center) / width
}

/// Text attached to `focus-away-5s`
pub fn focus_detail(ema: f64) -> String {
    format!("eye-offset≈{:.0}%", ema.abs() * 100.0)
}

/// Update the gaze EMA from the single visible face and emit
/// `focus-away-5s` once per continuous looking-away episode.
pub(super) fn evaluate_gaze(
    state: &mut DetectionState,
    config: &DetectionConfig,
    face: &FaceRegion,
    now: DateTime<Utc>,
    out: &mut Vec<Event>,
) {
    let alpha = config.gaze_smoothing;
    state.gaze_offset_ema = (1.0 - alpha) * state.gaze_offset_ema + alpha * offset_fraction(face);

    let away = state.gaze_offset_ema.abs() > config.gaze_threshold;
    if away && !state.looking_away {
        state.looking_away = true;
        state.looking_away_since = Some(now);
        state.focus_away_reported = false;
    } else if !away && state.looking_away {
        state.looking_away = false;
        state.looking_away_since = None;
    }

    let Some(since) = state.looking_away_since else {
        return;
    };
    let threshold = Duration::milliseconds(config.focus_away_threshold_ms as i64);
    if now - since > threshold && !state.focus_away_reported {
        out.push(Event::with_detail(
            EventType::FocusAway5s,
            now,
            focus_detail(state.gaze_offset_ema),
        ));
        state.focus_away_reported = true;
    }
}
