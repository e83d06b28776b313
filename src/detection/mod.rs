// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Detection module - turns noisy per-frame inference into debounced events
//!
//! The state machine is a pure transition, [`step`], over an explicitly owned
//! [`DetectionState`]. [`DetectionMachine`] holds that state for one
//! monitoring session and is the only thing that mutates it.

mod gaze;
mod objects;
mod presence;

pub use gaze::{focus_detail, offset_fraction};
pub use objects::suspicious_labels;
pub use presence::ABSENCE_DETAIL;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DetectionConfig, MonitorConfig};
use crate::core::Event;
use crate::inference::{DetectedObject, FaceRegion};

/// Inference results for one evaluated frame.
///
/// `faces` is `None` on frames the face model skipped (cadence throttling
/// or a failed inference); `objects` is `None` when no object scan ran.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub faces: Option<Vec<FaceRegion>>,
    pub objects: Option<Vec<DetectedObject>>,
}

impl FrameInput {
    pub fn faces(faces: Vec<FaceRegion>) -> Self {
        Self {
            faces: Some(faces),
            objects: None,
        }
    }

    pub fn objects(objects: Vec<DetectedObject>) -> Self {
        Self {
            faces: None,
            objects: Some(objects),
        }
    }
}

/// Operating flags that gate the object rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionMode {
    /// Reduced-resource mode (longer object scan interval)
    pub performance_mode: bool,
    pub objects_enabled: bool,
    /// Object scans pause while recording
    pub recording: bool,
}

impl From<&MonitorConfig> for DetectionMode {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            performance_mode: config.performance_mode,
            objects_enabled: config.objects_enabled,
            recording: false,
        }
    }
}

/// Temporal state for one monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionState {
    /// Face count of the previous evaluated frame
    pub face_count: usize,
    pub last_face_seen_at: DateTime<Utc>,
    /// `absence-10s` already emitted for the current absence
    pub no_face_logged: bool,
    pub looking_away: bool,
    pub looking_away_since: Option<DateTime<Utc>>,
    /// `focus-away-5s` already emitted for the current episode. Stands in
    /// for a "last logged event was the same" check: it is cleared on every
    /// rising edge of `looking_away`, so suppression never needs the log.
    pub focus_away_reported: bool,
    pub gaze_offset_ema: f64,
    pub last_object_scan_at: Option<DateTime<Utc>>,
    /// Label set of the last `object-detected` event
    pub last_object_labels: Option<String>,
}

impl DetectionState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            face_count: 0,
            last_face_seen_at: now,
            no_face_logged: false,
            looking_away: false,
            looking_away_since: None,
            focus_away_reported: false,
            gaze_offset_ema: 0.0,
            last_object_scan_at: None,
            last_object_labels: None,
        }
    }
}

/// Whether an object scan may run at `now`
pub fn object_scan_due(
    state: &DetectionState,
    config: &DetectionConfig,
    mode: DetectionMode,
    now: DateTime<Utc>,
) -> bool {
    if !mode.objects_enabled || mode.recording {
        return false;
    }
    let interval_ms = if mode.performance_mode {
        config.object_interval_reduced_ms
    } else {
        config.object_interval_ms
    };
    match state.last_object_scan_at {
        None => true,
        Some(last) => now - last > Duration::milliseconds(interval_ms as i64),
    }
}

/// One transition: previous state plus a frame's inference results yield
/// the next state and the events it emits, in emission order.
pub fn step(
    mut state: DetectionState,
    config: &DetectionConfig,
    mode: DetectionMode,
    input: &FrameInput,
    now: DateTime<Utc>,
) -> (DetectionState, Vec<Event>) {
    let mut events = Vec::new();

    if let Some(faces) = &input.faces {
        presence::evaluate_presence(&mut state, config, faces.len(), now, &mut events);
        if let [face] = faces.as_slice() {
            gaze::evaluate_gaze(&mut state, config, face, now, &mut events);
        }
    }

    if let Some(objects) = &input.objects {
        if object_scan_due(&state, config, mode, now) {
            objects::evaluate_objects(&mut state, config, objects, now, &mut events);
        }
    }

    (state, events)
}

/// Owns the detection state of one monitoring session
pub struct DetectionMachine {
    config: DetectionConfig,
    mode: DetectionMode,
    state: DetectionState,
}

impl DetectionMachine {
    pub fn new(config: DetectionConfig, mode: DetectionMode, now: DateTime<Utc>) -> Self {
        Self {
            config,
            mode,
            state: DetectionState::new(now),
        }
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DetectionMode) {
        self.mode = mode;
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.mode.recording = recording;
    }

    pub fn object_scan_due(&self, now: DateTime<Utc>) -> bool {
        object_scan_due(&self.state, &self.config, self.mode, now)
    }

    /// Evaluate one frame and return the events it produced
    pub fn evaluate(&mut self, input: &FrameInput, now: DateTime<Utc>) -> Vec<Event> {
        let (next, events) = step(self.state.clone(), &self.config, self.mode, input, now);
        self.state = next;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{format_time, EventType};

    fn face(offset: f64) -> FaceRegion {
        let eye = 100.0 + offset * 100.0;
        FaceRegion::new([50.0, 20.0], [150.0, 140.0]).with_eyes([eye - 20.0, 60.0], [eye + 20.0, 60.0])
    }

    fn ms(n: i64) -> Duration {
        Duration::milliseconds(n)
    }

    fn machine(start: DateTime<Utc>) -> DetectionMachine {
        DetectionMachine::new(
            DetectionConfig::default(),
            DetectionMode {
                performance_mode: true,
                objects_enabled: true,
                recording: false,
            },
            start,
        )
    }

    fn kinds(events: &[Event]) -> Vec<EventType> {
        events.iter().map(|e| e.event_type).collect()
    }

    #[test]
    fn test_absence_fires_once_per_episode() {
        let start = Utc::now();
        let mut m = machine(start);
        let mut events = m.evaluate(&FrameInput::faces(vec![face(0.0)]), start);
        assert_eq!(kinds(&events), vec![EventType::FaceFound]);

        for s in 1..=25 {
            events.extend(m.evaluate(&FrameInput::faces(vec![]), start + ms(s * 1000)));
        }
        let absences: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == EventType::Absence10s)
            .collect();
        assert_eq!(absences.len(), 1);
        // elapsed must exceed 10 s, so the first qualifying frame is at 11 s
        assert_eq!(absences[0].time, format_time(start + ms(11_000)));
        assert_eq!(absences[0].detail.as_deref(), Some(ABSENCE_DETAIL));

        let back = start + ms(26_000);
        events.extend(m.evaluate(&FrameInput::faces(vec![face(0.0)]), back));
        for s in 1..=12 {
            events.extend(m.evaluate(&FrameInput::faces(vec![]), back + ms(s * 1000)));
        }
        let absences = events
            .iter()
            .filter(|e| e.event_type == EventType::Absence10s)
            .count();
        assert_eq!(absences, 2);
        assert_eq!(
            events.iter().filter(|e| e.event_type == EventType::FaceFound).count(),
            2
        );
    }

    #[test]
    fn test_absence_counts_from_machine_start() {
        let start = Utc::now();
        let mut m = machine(start);
        let events = m.evaluate(&FrameInput::faces(vec![]), start + ms(10_500));
        assert_eq!(kinds(&events), vec![EventType::Absence10s]);
    }

    #[test]
    fn test_focus_away_once_per_episode() {
        let start = Utc::now();
        let mut m = machine(start);
        let mut events = Vec::new();
        let mut t = 0;

        // 30 frames at 0.5 s looking hard to the side
        for _ in 0..30 {
            events.extend(m.evaluate(&FrameInput::faces(vec![face(0.3)]), start + ms(t)));
            t += 500;
        }
        let focus: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == EventType::FocusAway5s)
            .collect();
        assert_eq!(focus.len(), 1);
        let detail = focus[0].detail.as_deref().unwrap();
        assert!(detail.starts_with("eye-offset≈"));
        assert!(detail.ends_with('%'));

        // look back until the EMA falls under the threshold
        while m.state().looking_away {
            events.extend(m.evaluate(&FrameInput::faces(vec![face(0.0)]), start + ms(t)));
            t += 500;
        }
        assert_eq!(m.state().looking_away_since, None);

        for _ in 0..30 {
            events.extend(m.evaluate(&FrameInput::faces(vec![face(-0.3)]), start + ms(t)));
            t += 500;
        }
        let focus = events
            .iter()
            .filter(|e| e.event_type == EventType::FocusAway5s)
            .count();
        assert_eq!(focus, 2);
    }

    #[test]
    fn test_short_glance_is_ignored() {
        let start = Utc::now();
        let mut m = machine(start);
        let mut events = Vec::new();
        for i in 0..8 {
            events.extend(m.evaluate(&FrameInput::faces(vec![face(0.3)]), start + ms(i * 500)));
        }
        assert!(m.state().looking_away);
        assert!(!events.iter().any(|e| e.event_type == EventType::FocusAway5s));
    }

    #[test]
    fn test_gaze_only_with_exactly_one_face() {
        let start = Utc::now();
        let mut m = machine(start);
        for i in 0..40 {
            m.evaluate(&FrameInput::faces(vec![face(0.4), face(0.4)]), start + ms(i * 500));
        }
        assert_eq!(m.state().gaze_offset_ema, 0.0);
        assert!(!m.state().looking_away);
    }

    #[test]
    fn test_object_scans_are_rate_limited() {
        let start = Utc::now();
        let mut m = machine(start);
        let phone = vec![DetectedObject::new("cell phone", 0.9)];
        let book = vec![DetectedObject::new("book", 0.9)];

        assert!(m.object_scan_due(start));
        let first = m.evaluate(&FrameInput::objects(phone.clone()), start);
        assert_eq!(first[0].detail.as_deref(), Some("cell phone"));

        // inside the 3.5 s reduced-mode interval: ignored
        assert!(!m.object_scan_due(start + ms(1_000)));
        assert!(m.evaluate(&FrameInput::objects(book.clone()), start + ms(1_000)).is_empty());

        assert!(m.evaluate(&FrameInput::objects(phone), start + ms(3_600)).is_empty());
        let next = m.evaluate(&FrameInput::objects(book), start + ms(7_200));
        assert_eq!(next[0].detail.as_deref(), Some("book"));
    }

    #[test]
    fn test_full_mode_interval_is_shorter() {
        let start = Utc::now();
        let mut m = machine(start);
        m.set_mode(DetectionMode {
            performance_mode: false,
            objects_enabled: true,
            recording: false,
        });
        m.evaluate(&FrameInput::objects(vec![]), start);
        assert!(!m.object_scan_due(start + ms(1_200)));
        assert!(m.object_scan_due(start + ms(1_201)));
    }

    #[test]
    fn test_objects_paused_while_recording_or_disabled() {
        let start = Utc::now();
        let mut m = machine(start);
        m.set_recording(true);
        let phone = vec![DetectedObject::new("cell phone", 0.9)];
        assert!(m.evaluate(&FrameInput::objects(phone.clone()), start).is_empty());
        assert_eq!(m.state().last_object_scan_at, None);

        m.set_recording(false);
        m.set_mode(DetectionMode {
            objects_enabled: false,
            ..m.mode()
        });
        assert!(m.evaluate(&FrameInput::objects(phone), start).is_empty());
    }

    #[test]
    fn test_step_is_pure() {
        let start = Utc::now();
        let config = DetectionConfig::default();
        let mode = DetectionMode::from(&MonitorConfig::default());
        let state = DetectionState::new(start);
        let input = FrameInput::faces(vec![face(0.0), face(0.1)]);

        let (a, ea) = step(state.clone(), &config, mode, &input, start + ms(100));
        let (b, eb) = step(state, &config, mode, &input, start + ms(100));
        assert_eq!(a, b);
        assert_eq!(ea, eb);
        assert_eq!(
            kinds(&ea),
            vec![EventType::FaceFound, EventType::MultipleFaces]
        );
    }

    #[test]
    fn test_skipped_face_frames_keep_previous_count() {
        let start = Utc::now();
        let mut m = machine(start);
        m.evaluate(&FrameInput::faces(vec![face(0.0)]), start);
        m.evaluate(&FrameInput::default(), start + ms(100));
        assert_eq!(m.state().face_count, 1);
        let events = m.evaluate(&FrameInput::faces(vec![face(0.0)]), start + ms(200));
        assert!(events.is_empty());
    }
}
