// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Monitor engine - drives frames through inference and detection

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

use super::event_bus::{EventBus, NoticeLevel};
use super::{Event, MonitorState, MonitorStatus};
use crate::config::{DetectionConfig, MonitorConfig};
use crate::delivery::PendingQueue;
use crate::detection::{DetectionMachine, DetectionMode, DetectionState, FrameInput};
use crate::inference::{Frame, InferenceAdapter, ModelStatus};

/// Runs the per-frame pipeline for one monitoring session.
///
/// Frames are processed one at a time; a frame arriving while the previous
/// one is still in inference is dropped.
pub struct Monitor {
    config: MonitorConfig,
    adapter: InferenceAdapter,
    machine: Mutex<DetectionMachine>,
    queue: Arc<PendingQueue>,
    bus: Arc<EventBus>,
    display_log: RwLock<Vec<Event>>,
    state: RwLock<MonitorState>,
    frames_seen: AtomicU64,
    frames_dropped: AtomicU64,
}

impl Monitor {
    /// `adapter` should already be initialised
    pub fn new(
        config: MonitorConfig,
        detection: DetectionConfig,
        adapter: InferenceAdapter,
        queue: Arc<PendingQueue>,
        bus: Arc<EventBus>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mode = DetectionMode::from(&config);
        Self {
            config,
            adapter,
            machine: Mutex::new(DetectionMachine::new(detection, mode, started_at)),
            queue,
            bus,
            display_log: RwLock::new(Vec::new()),
            state: RwLock::new(MonitorState::default()),
            frames_seen: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    /// Tell the operator about models that failed to load
    pub fn announce_model_status(&self) {
        let statuses = [
            ("Face model", self.adapter.face_status()),
            ("Object model", self.adapter.object_status()),
        ];
        for (name, status) in statuses {
            if let ModelStatus::Unavailable(reason) = status {
                self.bus.publish_notice(
                    NoticeLevel::Warning,
                    &format!("{} unavailable", name),
                    Some(reason.clone()),
                );
            }
        }
        if self.adapter.is_degraded() {
            warn!("Monitoring in degraded mode");
        }
    }

    /// Process one frame. Returns the events it emitted, empty when the
    /// frame was dropped.
    pub async fn process_frame(&self, frame: &Frame) -> Vec<Event> {
        let Ok(mut machine) = self.machine.try_lock() else {
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(frame = frame.sequence, "Monitor busy, frame dropped");
            return Vec::new();
        };

        let seen = self.frames_seen.fetch_add(1, Ordering::Relaxed) + 1;
        let now = frame.captured_at;

        let faces = if seen % self.config.face_stride() == 0 {
            self.adapter.detect_faces(frame).await
        } else {
            None
        };
        let objects = if self.adapter.has_object_model() && machine.object_scan_due(now) {
            self.adapter.detect_objects(frame).await
        } else {
            None
        };

        let input = FrameInput { faces, objects };
        let events = machine.evaluate(&input, now);
        if let Some(faces) = &input.faces {
            self.update_status(faces.len(), machine.state());
        }
        drop(machine);

        for event in &events {
            self.record(event.clone());
        }
        events
    }

    fn record(&self, event: Event) {
        info!(event = %event.event_type, detail = ?event.detail, "Detection event");
        self.display_log.write().push(event.clone());
        self.queue.push(event.clone());
        self.bus.publish_event(event);
    }

    fn update_status(&self, face_count: usize, detection: &DetectionState) {
        let status = match face_count {
            0 => MonitorStatus::NoFace,
            1 if detection.looking_away => MonitorStatus::LookingAway,
            1 => MonitorStatus::Focused,
            _ => MonitorStatus::MultipleFaces,
        };
        let mut state = self.state.write();
        state.status = status;
        state.face_count = face_count;
        state.gaze_offset = detection.gaze_offset_ema;
    }

    /// Pause or resume object scans
    pub async fn set_recording(&self, recording: bool) {
        self.machine.lock().await.set_recording(recording);
        self.state.write().recording = recording;
        info!("Recording {}", if recording { "started" } else { "stopped" });
    }

    pub async fn mode(&self) -> DetectionMode {
        self.machine.lock().await.mode()
    }

    pub fn state(&self) -> MonitorState {
        let mut state = self.state.read().clone();
        state.frames_seen = self.frames_seen.load(Ordering::Relaxed);
        state.frames_dropped = self.frames_dropped.load(Ordering::Relaxed);
        state.degraded = self.adapter.is_degraded();
        state
    }

    /// Events emitted so far, in emission order
    pub fn display_log(&self) -> Vec<Event> {
        self.display_log.read().clone()
    }

    /// Consume frames until the channel closes or shutdown fires
    pub async fn run(
        &self,
        mut frames: mpsc::Receiver<Frame>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!("Monitor started");
        self.state.write().running = true;

        loop {
            tokio::select! {
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        self.process_frame(&frame).await;
                    }
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }

        self.state.write().running = false;
        info!("Monitor stopped");
    }
}
