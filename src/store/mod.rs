// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Session store - in-memory record of every session and its event log
//!
//! Sessions live for the lifetime of the process. Appends to one session
//! are serialised by that session's own lock; different sessions never
//! contend beyond the brief map lookup.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::{Event, Session};
use crate::error::{Error, Result};

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new session and return its id
    pub fn create_session(&self, candidate_name: Option<String>) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), candidate_name, Utc::now());
        info!(session = %id, candidate = ?session.candidate_name, "Session created");

        self.sessions
            .write()
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    fn handle(&self, id: &str) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Validate untrusted event candidates and append the well-formed ones
    /// in order. Returns how many were appended.
    pub fn append_events(&self, id: &str, candidates: &[serde_json::Value]) -> Result<usize> {
        let session = self.handle(id)?;

        let mut valid = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match Event::from_value(candidate) {
                Ok(event) => valid.push(event),
                Err(e) => debug!(session = %id, "Dropping event: {}", e),
            }
        }

        let appended = valid.len();
        session.lock().events.extend(valid);
        Ok(appended)
    }

    /// Append events that are already typed
    pub fn append_typed(&self, id: &str, events: &[Event]) -> Result<usize> {
        let session = self.handle(id)?;
        session.lock().events.extend_from_slice(events);
        Ok(events.len())
    }

    /// Consistent snapshot of one session
    pub fn get_session(&self, id: &str) -> Result<Session> {
        let session = self.handle(id)?;
        let snapshot = session.lock().clone();
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
