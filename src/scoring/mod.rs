// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Integrity scoring

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{Event, EventType};

pub const MAX_SCORE: u32 = 100;

/// Points deducted per occurrence
pub fn penalty(event_type: EventType) -> u32 {
    match event_type {
        EventType::Absence10s => 10,
        EventType::MultipleFaces => 10,
        EventType::ObjectDetected => 5,
        EventType::FocusAway5s => 5,
        EventType::SessionStart | EventType::FaceFound => 0,
    }
}

/// Score plus the per-type counts it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityScore {
    pub score: u32,
    pub counts: BTreeMap<EventType, usize>,
}

impl IntegrityScore {
    pub fn count(&self, event_type: EventType) -> usize {
        self.counts.get(&event_type).copied().unwrap_or(0)
    }
}

/// 100 minus the penalties of every event, floored at 0
pub fn compute_integrity_score(events: &[Event]) -> IntegrityScore {
    let mut counts: BTreeMap<EventType, usize> =
        EventType::ALL.iter().map(|t| (*t, 0)).collect();
    for event in events {
        *counts.entry(event.event_type).or_insert(0) += 1;
    }

    let deducted: u64 = counts
        .iter()
        .map(|(t, n)| penalty(*t) as u64 * *n as u64)
        .sum();
    let score = (MAX_SCORE as u64).saturating_sub(deducted) as u32;

    IntegrityScore { score, counts }
}
