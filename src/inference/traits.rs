// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Inference model traits and common types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// A captured video frame. Pixel layout is the capture source's business.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl Frame {
    pub fn new(sequence: u64, captured_at: DateTime<Utc>, width: u32, height: u32) -> Self {
        Self {
            sequence,
            captured_at,
            width,
            height,
            pixels: Arc::new(Vec::new()),
        }
    }
}

/// A detected face: bounding box in pixel coordinates plus optional landmarks.
///
/// Landmarks follow the short-range face model order:
/// right eye, left eye, nose, mouth, right ear, left ear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub top_left: [f64; 2],
    pub bottom_right: [f64; 2],
    #[serde(default)]
    pub landmarks: Vec<[f64; 2]>,
    #[serde(default)]
    pub probability: Option<f64>,
}

impl FaceRegion {
    pub fn new(top_left: [f64; 2], bottom_right: [f64; 2]) -> Self {
        Self {
            top_left,
            bottom_right,
            landmarks: Vec::new(),
            probability: None,
        }
    }

    pub fn with_eyes(mut self, right_eye: [f64; 2], left_eye: [f64; 2]) -> Self {
        self.landmarks = vec![right_eye, left_eye];
        self
    }

    pub fn width(&self) -> f64 {
        self.bottom_right[0] - self.top_left[0]
    }

    pub fn center_x(&self) -> f64 {
        (self.top_left[0] + self.bottom_right[0]) / 2.0
    }

    /// Horizontal midpoint of the two eye landmarks, if present
    pub fn eye_center_x(&self) -> Option<f64> {
        match self.landmarks.as_slice() {
            [right, left, ..] => Some((right[0] + left[0]) / 2.0),
            _ => None,
        }
    }
}

/// A detected object with its class label and confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub score: f64,
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
}

impl DetectedObject {
    pub fn new(label: &str, score: f64) -> Self {
        Self {
            label: label.to_string(),
            score,
            bbox: None,
        }
    }
}

/// Model lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    NotLoaded,
    Ready,
    Unavailable(String),
    Disabled,
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready)
    }
}

/// Face-landmark model
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Load weights / warm up
    async fn load(&mut self) -> Result<()>;

    /// Detect faces in a frame
    async fn detect_faces(&self, frame: &Frame) -> Result<Vec<FaceRegion>>;
}

/// Object-recognition model
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Load weights / warm up
    async fn load(&mut self) -> Result<()>;

    /// Detect objects in a frame
    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectedObject>>;
}
