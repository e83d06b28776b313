// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Invigilator - remote proctoring event pipeline
//!
//! Watches a candidate through per-frame face and object inference, turns
//! the noisy detections into debounced integrity events, ships them to a
//! session store over an unreliable network, and scores and exports the
//! accumulated log.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── client ────────────────────────┐
//! │  ┌───────────┐  ┌───────────┐  ┌─────────┐  ┌────────┐ │
//! │  │ Inference │→ │ Detection │→ │ Pending │→ │Delivery│─┼──┐
//! │  │ Adapter   │  │ Machine   │  │ Queue   │  │        │ │  │
//! │  └───────────┘  └───────────┘  └─────────┘  └────────┘ │  │
//! │                       ↓                                │  │ HTTP
//! │                 ┌───────────┐                          │  │
//! │                 │ Event Bus │ (operator toasts)        │  │
//! │                 └───────────┘                          │  │
//! └────────────────────────────────────────────────────────┘  │
//! ┌──────────────────────── server ────────────────────────┐  │
//! │  ┌───────────┐  ┌─────────┐  ┌──────────┐              │  │
//! │  │ Session   │→ │ Scoring │→ │ Reports  │ CSV / PDF    │←─┘
//! │  │ Store     │  │         │  │          │              │
//! │  └───────────┘  └─────────┘  └──────────┘              │
//! └────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod delivery;
pub mod detection;
pub mod error;
pub mod inference;
pub mod report;
pub mod scoring;
pub mod server;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use core::{Event, EventBus, EventType, Monitor, Scheduler, Session};
pub use delivery::{EventDelivery, HttpSessionApi, PendingQueue, SessionApi, SessionPhase};
pub use detection::{DetectionMachine, DetectionState, FrameInput};
pub use error::{Error, Result};
pub use scoring::{compute_integrity_score, IntegrityScore};
pub use store::SessionStore;

/// Invigilator version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Invigilator name
pub const NAME: &str = "Invigilator";
