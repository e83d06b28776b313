// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Simulated candidate for demo/testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::prelude::*;
use rand_distr::StandardNormal;
use std::sync::Arc;

use super::{DetectedObject, FaceDetector, FaceRegion, Frame, ObjectDetector};
use crate::error::{Error, Result};

/// What the simulated candidate is doing during a stretch of the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Focused,
    LookingAway,
    Absent,
    Companion,
    PhoneVisible,
}

/// Scripted candidate: cycles through behaviours with per-frame noise
pub struct SimulatedCandidate {
    script: Vec<(f64, Behavior)>,
    started_at: DateTime<Utc>,
    frame_width: f64,
    frame_height: f64,
    state: Mutex<SimState>,
}

struct SimState {
    rng: rand::rngs::StdRng,
    jitter_px: f64,
    dropout_probability: f64,
}

impl SimulatedCandidate {
    /// Default one-minute script
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self::with_script(
            started_at,
            vec![
                (15.0, Behavior::Focused),
                (8.0, Behavior::LookingAway),
                (7.0, Behavior::Focused),
                (12.0, Behavior::Absent),
                (4.0, Behavior::Companion),
                (14.0, Behavior::PhoneVisible),
            ],
        )
    }

    pub fn with_script(started_at: DateTime<Utc>, script: Vec<(f64, Behavior)>) -> Self {
        Self {
            script,
            started_at,
            frame_width: 320.0,
            frame_height: 240.0,
            state: Mutex::new(SimState {
                rng: rand::rngs::StdRng::from_entropy(),
                jitter_px: 1.5,
                dropout_probability: 0.02,
            }),
        }
    }

    /// Deterministic variant for tests
    pub fn seeded(mut self, seed: u64, dropout_probability: f64) -> Self {
        let state = self.state.get_mut();
        state.rng = rand::rngs::StdRng::seed_from_u64(seed);
        state.dropout_probability = dropout_probability;
        self
    }

    /// Behaviour at a point in time; the script loops
    pub fn behavior_at(&self, at: DateTime<Utc>) -> Behavior {
        let total: f64 = self.script.iter().map(|(secs, _)| secs).sum();
        if total <= 0.0 {
            return Behavior::Focused;
        }

        let elapsed = (at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        let mut t = elapsed % total;
        for (secs, behavior) in &self.script {
            if t < *secs {
                return *behavior;
            }
            t -= secs;
        }
        Behavior::Focused
    }

    fn face(&self, center_x: f64, eye_shift: f64, state: &mut SimState) -> FaceRegion {
        let width = 120.0;
        let height = 150.0;
        let dx = state.rng.sample::<f64, _>(StandardNormal) * state.jitter_px;
        let dy = state.rng.sample::<f64, _>(StandardNormal) * state.jitter_px;

        let left = center_x - width / 2.0 + dx;
        let top = (self.frame_height - height) / 2.0 + dy;
        let eye_y = top + height * 0.38;
        let eye_center = left + width / 2.0 + eye_shift * width;

        let mut face = FaceRegion::new([left, top], [left + width, top + height])
            .with_eyes([eye_center - 22.0, eye_y], [eye_center + 22.0, eye_y]);
        face.probability = Some(0.95);
        face
    }

    fn faces_at(&self, at: DateTime<Utc>) -> Vec<FaceRegion> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let dropout = state.dropout_probability.clamp(0.0, 1.0);
        if state.rng.gen_bool(dropout) {
            return Vec::new();
        }

        let center = self.frame_width / 2.0;
        match self.behavior_at(at) {
            Behavior::Absent => Vec::new(),
            Behavior::LookingAway => vec![self.face(center, 0.25, state)],
            Behavior::Companion => vec![
                self.face(center - 70.0, 0.0, state),
                self.face(center + 90.0, 0.0, state),
            ],
            Behavior::Focused | Behavior::PhoneVisible => {
                vec![self.face(center, 0.0, state)]
            }
        }
    }

    fn objects_at(&self, at: DateTime<Utc>) -> Vec<DetectedObject> {
        let mut state = self.state.lock();
        let mut objects = vec![DetectedObject::new("person", 0.97)];
        if self.behavior_at(at) == Behavior::PhoneVisible {
            let score = 0.85 + state.rng.gen_range(0.0..0.1);
            objects.push(DetectedObject::new("cell phone", score));
        }
        if state.rng.gen_bool(0.05) {
            objects.push(DetectedObject::new("cup", 0.6));
        }
        objects
    }
}

/// Face model backed by a [`SimulatedCandidate`]
pub struct SimulatedFaceModel {
    candidate: Arc<SimulatedCandidate>,
    fail_load: bool,
}

impl SimulatedFaceModel {
    pub fn new(candidate: Arc<SimulatedCandidate>) -> Self {
        Self {
            candidate,
            fail_load: false,
        }
    }

    /// A model whose initialisation fails
    pub fn unavailable(candidate: Arc<SimulatedCandidate>) -> Self {
        Self {
            candidate,
            fail_load: true,
        }
    }
}

#[async_trait]
impl FaceDetector for SimulatedFaceModel {
    fn name(&self) -> &str {
        "simulated-face"
    }

    async fn load(&mut self) -> Result<()> {
        if self.fail_load {
            return Err(Error::Inference("simulated load failure".into()));
        }
        Ok(())
    }

    async fn detect_faces(&self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        Ok(self.candidate.faces_at(frame.captured_at))
    }
}

/// Object model backed by a [`SimulatedCandidate`]
pub struct SimulatedObjectModel {
    candidate: Arc<SimulatedCandidate>,
}

impl SimulatedObjectModel {
    pub fn new(candidate: Arc<SimulatedCandidate>) -> Self {
        Self { candidate }
    }
}

#[async_trait]
impl ObjectDetector for SimulatedObjectModel {
    fn name(&self) -> &str {
        "simulated-objects"
    }

    async fn load(&mut self) -> Result<()> {
        Ok(())
    }

    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectedObject>> {
        Ok(self.candidate.objects_at(frame.captured_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_script_loops() {
        let start = Utc::now();
        let sim = SimulatedCandidate::new(start);

        assert_eq!(sim.behavior_at(start), Behavior::Focused);
        assert_eq!(sim.behavior_at(start + Duration::seconds(16)), Behavior::LookingAway);
        assert_eq!(sim.behavior_at(start + Duration::seconds(35)), Behavior::Absent);
        assert_eq!(sim.behavior_at(start + Duration::seconds(43)), Behavior::Companion);
        assert_eq!(sim.behavior_at(start + Duration::seconds(50)), Behavior::PhoneVisible);
        assert_eq!(sim.behavior_at(start + Duration::seconds(61)), Behavior::Focused);
    }

    #[test]
    fn test_faces_follow_behavior() {
        let start = Utc::now();
        let sim = SimulatedCandidate::new(start).seeded(7, 0.0);

        let focused = sim.faces_at(start + Duration::seconds(1));
        assert_eq!(focused.len(), 1);
        let face = &focused[0];
        let offset = (face.eye_center_x().unwrap() - face.center_x()) / face.width();
        assert!(offset.abs() < 0.01);

        let away = sim.faces_at(start + Duration::seconds(16));
        let face = &away[0];
        let offset = (face.eye_center_x().unwrap() - face.center_x()) / face.width();
        assert!(offset > 0.2);

        assert!(sim.faces_at(start + Duration::seconds(35)).is_empty());
        assert_eq!(sim.faces_at(start + Duration::seconds(43)).len(), 2);
    }

    #[test]
    fn test_phone_only_when_visible() {
        let start = Utc::now();
        let sim = SimulatedCandidate::new(start).seeded(11, 0.0);

        let quiet = sim.objects_at(start + Duration::seconds(1));
        assert!(quiet.iter().all(|o| o.label != "cell phone"));

        let phone = sim.objects_at(start + Duration::seconds(50));
        assert!(phone.iter().any(|o| o.label == "cell phone" && o.score > 0.8));
    }
}
