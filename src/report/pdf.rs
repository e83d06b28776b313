// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Single-page PDF 1.4 report in base-14 Helvetica

use std::fmt::Write as _;

use super::{ReportContext, ReportFormat, ReportRenderer};
use crate::core::EventType;
use crate::error::{Error, Result};

const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const TOP: f64 = 800.0;
const BOTTOM_MARGIN: f64 = 60.0;

/// One positioned line of text
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLine {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub text: String,
}

pub struct PdfRenderer {
    window: usize,
    line_width: usize,
}

/// Map to printable ASCII so base-14 fonts can draw it
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '≈' => '~',
            ' '..='~' => c,
            _ => '?',
        })
        .collect()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn summary_label(event_type: EventType) -> &'static str {
    match event_type {
        EventType::FaceFound => "Face-found events",
        EventType::MultipleFaces => "Multiple faces",
        EventType::Absence10s => "Absence >10s",
        EventType::FocusAway5s => "Focus away >5s",
        EventType::ObjectDetected => "Objects detected",
        EventType::SessionStart => "Sessions started",
    }
}

impl PdfRenderer {
    pub fn new(window: usize, line_width: usize) -> Self {
        Self { window, line_width }
    }

    /// Text lines of the report, top to bottom
    pub fn layout(&self, ctx: &ReportContext<'_>) -> Vec<PdfLine> {
        let session = ctx.session;
        let mut lines = Vec::new();
        let mut y = TOP;
        let put = |lines: &mut Vec<PdfLine>, x: f64, y: f64, size: f64, text: String| {
            lines.push(PdfLine {
                x,
                y,
                size,
                text: sanitize(&text),
            });
        };

        put(&mut lines, 50.0, y, 20.0, "Proctoring Report".into());
        y -= 30.0;
        put(&mut lines, 50.0, y, 12.0, format!("Session ID: {}", session.id));
        y -= 16.0;
        let candidate = session.candidate_name.as_deref().unwrap_or("N/A");
        put(&mut lines, 50.0, y, 12.0, format!("Candidate: {}", candidate));
        y -= 16.0;
        let minutes = session.duration_minutes(ctx.generated_at);
        put(&mut lines, 50.0, y, 12.0, format!("Duration: {} min", minutes));
        y -= 16.0;
        put(&mut lines, 50.0, y, 12.0, format!("Integrity Score: {}/100", ctx.score.score));
        y -= 24.0;

        put(&mut lines, 50.0, y, 14.0, "Summary".into());
        y -= 18.0;
        let summarised = [
            EventType::FaceFound,
            EventType::MultipleFaces,
            EventType::Absence10s,
            EventType::FocusAway5s,
            EventType::ObjectDetected,
        ];
        for event_type in summarised {
            let text = format!("{}: {}", summary_label(event_type), ctx.score.count(event_type));
            put(&mut lines, 60.0, y, 12.0, text);
            y -= 14.0;
        }
        y -= 10.0;

        put(&mut lines, 50.0, y, 14.0, "Event Log (time, type, detail)".into());
        y -= 18.0;
        for event in session.recent_events(self.window) {
            let mut row = format!("{}  |  {}", event.time, event.event_type);
            if let Some(detail) = event.detail.as_deref().filter(|d| !d.is_empty()) {
                row.push_str("  |  ");
                row.push_str(detail);
            }
            let row: String = row.chars().take(self.line_width).collect();
            put(&mut lines, 60.0, y, 12.0, row);
            y -= 14.0;
            if y < BOTTOM_MARGIN {
                break;
            }
        }

        lines
    }

    fn content_stream(lines: &[PdfLine]) -> Result<String> {
        let mut stream = String::new();
        for line in lines {
            writeln!(
                stream,
                "BT /F1 {} Tf {:.2} {:.2} Td ({}) Tj ET",
                line.size,
                line.x,
                line.y,
                escape(&line.text)
            )
            .map_err(|e| Error::Report(e.to_string()))?;
        }
        Ok(stream)
    }
}

impl ReportRenderer for PdfRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Pdf
    }

    fn render(&self, ctx: &ReportContext<'_>) -> Result<Vec<u8>> {
        let stream = Self::content_stream(&self.layout(ctx))?;

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT
            ),
            format!("<< /Length {} >>\nstream\n{}endstream", stream.len(), stream),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }

        let xref_at = out.len();
        out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            out.push_str(&format!("{:010} 00000 n \n", offset));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        ));

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, Session};
    use chrono::{Duration, TimeZone, Utc};

    fn session_with(events: Vec<Event>) -> Session {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut session = Session::new("abc-123".into(), None, t);
        session.events = events;
        session
    }

    fn texts(lines: &[PdfLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_header_block() {
        let session = session_with(vec![]);
        let now = session.created_at + Duration::seconds(150);
        let lines = PdfRenderer::new(30, 90).layout(&ReportContext::new(&session, now));
        let text = texts(&lines);

        assert_eq!(text[0], "Proctoring Report");
        assert_eq!(text[1], "Session ID: abc-123");
        assert_eq!(text[2], "Candidate: N/A");
        assert_eq!(text[3], "Duration: 3 min");
        assert_eq!(text[4], "Integrity Score: 100/100");
        assert_eq!(text[5], "Summary");
        assert_eq!(text[6], "Face-found events: 0");
        assert_eq!(text[10], "Objects detected: 0");
        assert_eq!(*text.last().unwrap(), "Event Log (time, type, detail)");
        assert_eq!(lines[0].size, 20.0);
    }

    #[test]
    fn test_event_window_and_truncation() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut events: Vec<Event> = (0..40)
            .map(|i| Event::with_detail(EventType::FaceFound, t, format!("#{}", i)))
            .collect();
        events.push(Event::with_detail(EventType::FocusAway5s, t, "eye-offset≈31%"));
        events.push(Event::with_detail(EventType::ObjectDetected, t, "x".repeat(200)));
        let session = session_with(events);

        let lines = PdfRenderer::new(30, 90).layout(&ReportContext::new(&session, t));
        let rows: Vec<_> = lines.iter().skip(12).collect();
        assert_eq!(rows.len(), 30);
        assert_eq!(rows[0].text, "2024-03-01T10:00:00.000Z  |  face-found  |  #12");
        assert_eq!(rows[28].text, "2024-03-01T10:00:00.000Z  |  focus-away-5s  |  eye-offset~31%");
        assert_eq!(rows[29].text.chars().count(), 90);
        assert!(rows.iter().all(|r| r.y >= BOTTOM_MARGIN));
    }

    #[test]
    fn test_sanitize_and_escape() {
        assert_eq!(sanitize("a≈b"), "a~b");
        assert_eq!(sanitize("Zoë"), "Zo?");
        assert_eq!(escape("f(x) \\ y"), "f\\(x\\) \\\\ y");
    }

    #[test]
    fn test_render_is_well_formed() {
        let session = session_with(vec![Event::new(EventType::SessionStart, Utc::now())]);
        let bytes = PdfRenderer::new(30, 90)
            .render(&ReportContext::new(&session, Utc::now()))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("(Session ID: abc-123) Tj"));

        let startxref: usize = text
            .lines()
            .rev()
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[startxref..].starts_with("xref"));
    }
}
