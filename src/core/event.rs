// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Integrity events and sessions

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Closed set of integrity event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    SessionStart,
    FaceFound,
    MultipleFaces,
    #[serde(rename = "absence-10s")]
    Absence10s,
    #[serde(rename = "focus-away-5s")]
    FocusAway5s,
    ObjectDetected,
}

impl EventType {
    /// All event types in report order
    pub const ALL: [EventType; 6] = [
        EventType::SessionStart,
        EventType::FaceFound,
        EventType::MultipleFaces,
        EventType::Absence10s,
        EventType::FocusAway5s,
        EventType::ObjectDetected,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionStart => "session-start",
            EventType::FaceFound => "face-found",
            EventType::MultipleFaces => "multiple-faces",
            EventType::Absence10s => "absence-10s",
            EventType::FocusAway5s => "focus-away-5s",
            EventType::ObjectDetected => "object-detected",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::MalformedInput(format!("unknown event type '{}'", s)))
    }
}

/// A timestamped, typed integrity record. Immutable once created.
///
/// `time` is kept as text. Locally produced events carry RFC 3339 with
/// millisecond precision; events accepted from a client keep whatever
/// string the client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Event {
    pub fn new(event_type: EventType, time: DateTime<Utc>) -> Self {
        Self {
            time: format_time(time),
            event_type,
            detail: None,
        }
    }

    pub fn with_detail(event_type: EventType, time: DateTime<Utc>, detail: impl Into<String>) -> Self {
        Self {
            time: format_time(time),
            event_type,
            detail: Some(detail.into()),
        }
    }

    /// Validate an untrusted event candidate.
    ///
    /// `time` must be a string and is stored verbatim; `type` must name a
    /// known event. A non-string `detail` is discarded rather than
    /// rejecting the event.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, Error> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::MalformedInput("event is not an object".into()))?;

        let time = obj
            .get("time")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::MalformedInput("missing string 'time'".into()))?
            .to_string();

        let event_type = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::MalformedInput("missing string 'type'".into()))?
            .parse()?;

        let detail = obj
            .get("detail")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Self {
            time,
            event_type,
            detail,
        })
    }

    /// Parsed `time`, when it is RFC 3339
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One monitored candidate's record. The log is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    pub events: Vec<Event>,
}

impl Session {
    pub fn new(id: String, candidate_name: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            candidate_name,
            events: Vec::new(),
        }
    }

    /// The most recent `n` events, oldest first. Does not touch the log.
    pub fn recent_events(&self, n: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }

    /// Whole minutes elapsed since creation, rounded, never negative
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> i64 {
        let ms = (now - self.created_at).num_milliseconds().max(0);
        (ms + 30_000) / 60_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};
    use serde_json::json;

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventType::Absence10s).unwrap();
        assert_eq!(json, "\"absence-10s\"");
        let parsed: EventType = serde_json::from_str("\"focus-away-5s\"").unwrap();
        assert_eq!(parsed, EventType::FocusAway5s);

        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
            assert_eq!(serde_json::to_value(t).unwrap(), json!(t.as_str()));
        }
    }

    #[test]
    fn test_event_serializes_type_field() {
        let time = DateTime::parse_from_rfc3339("2026-01-02T03:04:05.678Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = Event::with_detail(EventType::ObjectDetected, time, "book, cell phone");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "object-detected");
        assert_eq!(value["detail"], "book, cell phone");

        let bare = serde_json::to_value(Event::new(EventType::FaceFound, time)).unwrap();
        assert!(bare.get("detail").is_none());
    }

    #[test]
    fn test_from_value_validation() {
        let ok = Event::from_value(&json!({
            "time": "2026-01-02T03:04:05Z",
            "type": "face-found",
            "detail": 42
        }))
        .unwrap();
        assert_eq!(ok.event_type, EventType::FaceFound);
        assert_eq!(ok.detail, None);

        assert!(Event::from_value(&json!({ "time": "2026-01-02T03:04:05Z" })).is_err());
        assert!(Event::from_value(&json!({ "type": "face-found" })).is_err());
        assert!(Event::from_value(&json!({ "time": 5, "type": "face-found" })).is_err());
        assert!(Event::from_value(&json!({ "time": "2026-01-02T03:04:05Z", "type": 3 })).is_err());
        assert!(Event::from_value(&json!({ "time": "2026-01-02T03:04:05Z", "type": "coffee" })).is_err());
        assert!(Event::from_value(&json!("face-found")).is_err());
    }

    #[test]
    fn test_client_time_is_kept_verbatim() {
        for time in ["2024-03-01T10:00:00", "10:00:00 AM", "2024-03-01T10:00:00.123456+02:00"] {
            let event = Event::from_value(&json!({ "time": time, "type": "face-found" })).unwrap();
            assert_eq!(event.time, time);
        }

        let naive = Event::from_value(&json!({ "time": "10:00:00 AM", "type": "face-found" })).unwrap();
        assert_eq!(naive.timestamp(), None);
    }

    #[test]
    fn test_local_time_format() {
        let time = DateTime::parse_from_rfc3339("2026-01-02T05:04:05.678901+02:00")
            .unwrap()
            .with_timezone(&Utc);
        let event = Event::new(EventType::FaceFound, time);
        assert_eq!(event.time, "2026-01-02T03:04:05.678Z");
        assert_eq!(event.timestamp(), Some(time.with_nanosecond(678_000_000).unwrap()));
    }

    #[test]
    fn test_session_windowing_and_duration() {
        let created = Utc::now();
        let mut session = Session::new("s1".into(), None, created);
        for i in 0..5 {
            session
                .events
                .push(Event::new(EventType::FaceFound, created + Duration::seconds(i)));
        }

        let recent = session.recent_events(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].time, format_time(created + Duration::seconds(2)));
        assert_eq!(session.events.len(), 5);
        assert_eq!(session.recent_events(30).len(), 5);

        assert_eq!(session.duration_minutes(created + Duration::seconds(89)), 1);
        assert_eq!(session.duration_minutes(created + Duration::seconds(91)), 2);
        assert_eq!(session.duration_minutes(created - Duration::minutes(5)), 0);
    }
}
