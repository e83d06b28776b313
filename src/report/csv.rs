// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

use super::{ReportContext, ReportFormat, ReportRenderer};
use crate::error::Result;

/// `time,type,detail`, one row per event in log order
pub struct CsvRenderer;

fn field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl ReportRenderer for CsvRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Csv
    }

    fn render(&self, ctx: &ReportContext<'_>) -> Result<Vec<u8>> {
        let mut out = String::from("time,type,detail\n");
        for event in &ctx.session.events {
            out.push_str(&format!(
                "{},{},{}\n",
                field(&event.time),
                event.event_type,
                field(event.detail.as_deref().unwrap_or(""))
            ));
        }
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, EventType, Session};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_header_only_for_empty_log() {
        let session = Session::new("s".into(), None, Utc::now());
        let bytes = CsvRenderer.render(&ReportContext::new(&session, Utc::now())).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "time,type,detail\n");
    }

    #[test]
    fn test_rows_in_log_order_with_quoting() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut session = Session::new("s".into(), Some("Ada".into()), t);
        session.events = vec![
            Event::new(EventType::SessionStart, t),
            Event::with_detail(EventType::ObjectDetected, t, "book, cell phone"),
            Event::with_detail(EventType::FocusAway5s, t, "said \"hi\""),
            Event::with_detail(EventType::Absence10s, t, "No face for >10s"),
        ];

        let bytes = CsvRenderer.render(&ReportContext::new(&session, t)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "time,type,detail",
                "2024-03-01T10:00:00.000Z,session-start,",
                "2024-03-01T10:00:00.000Z,object-detected,\"book, cell phone\"",
                "2024-03-01T10:00:00.000Z,focus-away-5s,\"said \"\"hi\"\"\"",
                "2024-03-01T10:00:00.000Z,absence-10s,No face for >10s",
            ]
        );
    }

    #[test]
    fn test_client_time_is_echoed() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut session = Session::new("s".into(), None, t);
        let mut event = Event::new(EventType::FaceFound, t);
        event.time = "2024-03-01T10:00:00+01:00".into();
        session.events.push(event);

        let bytes = CsvRenderer.render(&ReportContext::new(&session, t)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().nth(1), Some("2024-03-01T10:00:00+01:00,face-found,"));
    }
}
