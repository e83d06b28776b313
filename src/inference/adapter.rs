// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Inference adapter - owns the face and object models

use tracing::{info, warn};

use super::{DetectedObject, FaceDetector, FaceRegion, Frame, ModelStatus, ObjectDetector};
use crate::error::Error;

/// Wraps the face-landmark and object-recognition models.
///
/// A model that fails to initialise is dropped and its modality is skipped
/// for the rest of the session.
pub struct InferenceAdapter {
    face_model: Option<Box<dyn FaceDetector>>,
    object_model: Option<Box<dyn ObjectDetector>>,
    face_status: ModelStatus,
    object_status: ModelStatus,
}

impl InferenceAdapter {
    pub fn new(
        face_model: Option<Box<dyn FaceDetector>>,
        object_model: Option<Box<dyn ObjectDetector>>,
    ) -> Self {
        let face_status = if face_model.is_some() {
            ModelStatus::NotLoaded
        } else {
            ModelStatus::Disabled
        };
        let object_status = if object_model.is_some() {
            ModelStatus::NotLoaded
        } else {
            ModelStatus::Disabled
        };

        Self {
            face_model,
            object_model,
            face_status,
            object_status,
        }
    }

    /// Load every configured model. Failures degrade, they never abort.
    pub async fn initialize(&mut self) {
        if let Some(mut model) = self.face_model.take() {
            match model.load().await {
                Ok(()) => {
                    info!("Face model '{}' loaded", model.name());
                    self.face_status = ModelStatus::Ready;
                    self.face_model = Some(model);
                }
                Err(e) => {
                    let err = Error::ModelUnavailable(format!("{}: {}", model.name(), e));
                    warn!("{}; face detection disabled", err);
                    self.face_status = ModelStatus::Unavailable(err.to_string());
                }
            }
        }

        if let Some(mut model) = self.object_model.take() {
            match model.load().await {
                Ok(()) => {
                    info!("Object model '{}' loaded", model.name());
                    self.object_status = ModelStatus::Ready;
                    self.object_model = Some(model);
                }
                Err(e) => {
                    let err = Error::ModelUnavailable(format!("{}: {}", model.name(), e));
                    warn!("{}; object detection disabled", err);
                    self.object_status = ModelStatus::Unavailable(err.to_string());
                }
            }
        }
    }

    pub fn face_status(&self) -> &ModelStatus {
        &self.face_status
    }

    pub fn object_status(&self) -> &ModelStatus {
        &self.object_status
    }

    /// True when any configured model failed to load
    pub fn is_degraded(&self) -> bool {
        matches!(self.face_status, ModelStatus::Unavailable(_))
            || matches!(self.object_status, ModelStatus::Unavailable(_))
    }

    pub fn has_object_model(&self) -> bool {
        self.object_status.is_ready()
    }

    /// Run the face model. `None` means this frame has no face result.
    pub async fn detect_faces(&self, frame: &Frame) -> Option<Vec<FaceRegion>> {
        let model = self.ready_face_model()?;
        match model.detect_faces(frame).await {
            Ok(faces) => Some(faces),
            Err(e) => {
                warn!(frame = frame.sequence, "Face inference failed: {}", e);
                None
            }
        }
    }

    /// Run the object model. `None` means this frame has no object result.
    pub async fn detect_objects(&self, frame: &Frame) -> Option<Vec<DetectedObject>> {
        let model = self.ready_object_model()?;
        match model.detect_objects(frame).await {
            Ok(objects) => Some(objects),
            Err(e) => {
                warn!(frame = frame.sequence, "Object inference failed: {}", e);
                None
            }
        }
    }

    fn ready_face_model(&self) -> Option<&dyn FaceDetector> {
        if self.face_status.is_ready() {
            self.face_model.as_deref()
        } else {
            None
        }
    }

    fn ready_object_model(&self) -> Option<&dyn ObjectDetector> {
        if self.object_status.is_ready() {
            self.object_model.as_deref()
        } else {
            None
        }
    }
}
