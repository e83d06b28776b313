// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Inference module - face/object model interfaces and simulations

mod adapter;
mod simulator;
mod traits;

pub use adapter::InferenceAdapter;
pub use simulator::{Behavior, SimulatedCandidate, SimulatedFaceModel, SimulatedObjectModel};
pub use traits::{DetectedObject, FaceDetector, FaceRegion, Frame, ModelStatus, ObjectDetector};
