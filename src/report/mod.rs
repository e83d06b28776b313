// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Report rendering - CSV and PDF exports of a session

mod csv;
mod pdf;

pub use self::csv::CsvRenderer;
pub use self::pdf::{PdfLine, PdfRenderer};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::core::Session;
use crate::error::Result;
use crate::scoring::{compute_integrity_score, IntegrityScore};

/// Export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Csv,
    Pdf,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv",
            ReportFormat::Pdf => "application/pdf",
        }
    }

    pub fn content_disposition(&self, session_id: &str) -> String {
        format!(
            "attachment; filename=\"report-{}.{}\"",
            session_id,
            self.extension()
        )
    }
}

/// Everything a renderer sees
pub struct ReportContext<'a> {
    pub session: &'a Session,
    pub score: IntegrityScore,
    pub generated_at: DateTime<Utc>,
}

impl<'a> ReportContext<'a> {
    pub fn new(session: &'a Session, generated_at: DateTime<Utc>) -> Self {
        Self {
            session,
            score: compute_integrity_score(&session.events),
            generated_at,
        }
    }
}

/// Turns a scored session into bytes
pub trait ReportRenderer: Send + Sync {
    fn format(&self) -> ReportFormat;
    fn render(&self, ctx: &ReportContext<'_>) -> Result<Vec<u8>>;
}

pub fn renderer_for(format: ReportFormat, config: &ServerConfig) -> Box<dyn ReportRenderer> {
    match format {
        ReportFormat::Csv => Box::new(CsvRenderer),
        ReportFormat::Pdf => Box::new(PdfRenderer::new(
            config.report_window,
            config.report_line_width,
        )),
    }
}
