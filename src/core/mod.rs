// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Core module - event model, monitor engine and timing

mod engine;
mod event;
pub mod event_bus;
mod scheduler;

pub use engine::Monitor;
pub use event::{format_time, Event, EventType, Session};
pub use event_bus::{EventBus, Notice, NoticeLevel};
pub use scheduler::Scheduler;

use serde::{Deserialize, Serialize};

/// Operator-facing status derived from the latest evaluated frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorStatus {
    Initializing,
    NoFace,
    Focused,
    LookingAway,
    MultipleFaces,
}

/// Monitor snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorState {
    pub running: bool,
    pub recording: bool,
    pub degraded: bool,
    pub status: MonitorStatus,
    pub face_count: usize,
    pub gaze_offset: f64,
    pub frames_seen: u64,
    pub frames_dropped: u64,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            running: false,
            recording: false,
            degraded: false,
            status: MonitorStatus::Initializing,
            face_count: 0,
            gaze_offset: 0.0,
            frames_seen: 0,
            frames_dropped: 0,
        }
    }
}
