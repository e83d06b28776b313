// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Event bus for operator-facing notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use super::{Event, EventType};

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient operator notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Toast for a detection event; `None` for events the operator isn't shown
pub fn toast_for(event: &Event) -> Option<(NoticeLevel, String, Option<String>)> {
    let detail = event.detail.clone();
    match event.event_type {
        EventType::FaceFound => Some((NoticeLevel::Info, "Face detected".into(), None)),
        EventType::MultipleFaces => {
            Some((NoticeLevel::Warning, "Multiple faces detected".into(), None))
        }
        EventType::Absence10s => Some((NoticeLevel::Error, "No face for >10s".into(), None)),
        EventType::FocusAway5s => Some((NoticeLevel::Info, "Looking away >5s".into(), detail)),
        EventType::ObjectDetected => Some((NoticeLevel::Warning, "Object detected".into(), detail)),
        EventType::SessionStart => None,
    }
}

/// Broadcasts emitted events and operator notices
pub struct EventBus {
    event_tx: broadcast::Sender<Event>,
    notice_tx: broadcast::Sender<Notice>,
    notice_counter: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        let (notice_tx, _) = broadcast::channel(capacity);

        Self {
            event_tx,
            notice_tx,
            notice_counter: AtomicU64::new(0),
        }
    }

    /// Publish a detection event and its toast
    pub fn publish_event(&self, event: Event) {
        if let Some((level, title, description)) = toast_for(&event) {
            self.publish_notice(level, &title, description);
        }
        let _ = self.event_tx.send(event);
    }

    pub fn publish_notice(&self, level: NoticeLevel, title: &str, description: Option<String>) {
        let id = self.notice_counter.fetch_add(1, Ordering::Relaxed);
        let notice = Notice {
            id,
            level,
            title: title.to_string(),
            description,
            timestamp: Utc::now(),
        };
        let _ = self.notice_tx.send(notice);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_publishes_toast() {
        let bus = EventBus::new(16);
        let mut events = bus.subscribe_events();
        let mut notices = bus.subscribe_notices();

        bus.publish_event(Event::with_detail(EventType::FocusAway5s, Utc::now(), "eye-offset≈20%"));

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::FocusAway5s);
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.title, "Looking away >5s");
        assert_eq!(notice.description.as_deref(), Some("eye-offset≈20%"));
    }

    #[test]
    fn test_session_start_has_no_toast() {
        assert!(toast_for(&Event::new(EventType::SessionStart, Utc::now())).is_none());
        let (level, _, _) = toast_for(&Event::new(EventType::Absence10s, Utc::now())).unwrap();
        assert_eq!(level, NoticeLevel::Error);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish_event(Event::new(EventType::FaceFound, Utc::now()));
        bus.publish_notice(NoticeLevel::Info, "idle", None);
    }
}
