// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Delivery module - session identity and the pending event queue
//!
//! Events are buffered in a [`PendingQueue`] and shipped in batches by
//! [`EventDelivery::flush`]. A batch that fails in transit goes back to the
//! front of the queue. A batch the server rejects because it no longer
//! knows the session triggers a single recreate-and-retry.

mod client;
mod queue;
mod storage;

pub use client::{HttpSessionApi, SessionApi};
pub use queue::PendingQueue;
pub use storage::{FileSessionIdStorage, MemorySessionIdStorage, SessionIdStorage};

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::{Event, EventType};
use crate::error::Result;

/// Session identity lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Uninitialized,
    Ensuring,
    Ready,
}

/// What one flush did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush was in progress
    Skipped,
    /// Nothing to send, or no session could be opened
    Idle,
    Delivered(usize),
    /// Transport failure; the batch is back at the front of the queue
    Requeued(usize),
    /// Session recreated and the batch retried
    Recreated { delivered: bool },
}

struct SessionSlot {
    phase: SessionPhase,
    id: Option<String>,
}

/// Client side of the session store: owns the session id and the queue
pub struct EventDelivery {
    api: Arc<dyn SessionApi>,
    storage: Arc<dyn SessionIdStorage>,
    queue: Arc<PendingQueue>,
    candidate_name: Option<String>,
    session: RwLock<SessionSlot>,
    in_flight: Mutex<()>,
}

impl EventDelivery {
    pub fn new(
        api: Arc<dyn SessionApi>,
        storage: Arc<dyn SessionIdStorage>,
        queue: Arc<PendingQueue>,
        candidate_name: Option<String>,
    ) -> Self {
        Self {
            api,
            storage,
            queue,
            candidate_name,
            session: RwLock::new(SessionSlot {
                phase: SessionPhase::Uninitialized,
                id: None,
            }),
            in_flight: Mutex::new(()),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.read().phase
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.read().id.clone()
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    /// Buffer an event for the next flush
    pub fn enqueue(&self, event: Event) {
        self.queue.push(event);
    }

    /// Current session id, opening a new session if none is known.
    /// Waits for any flush in progress.
    pub async fn ensure_session(&self) -> Result<String> {
        let _guard = self.in_flight.lock().await;
        self.ensure_locked().await
    }

    async fn ensure_locked(&self) -> Result<String> {
        if let Some(id) = self.session_id() {
            return Ok(id);
        }

        if let Some(id) = self.storage.load() {
            info!(session = %id, "Resuming stored session");
            self.set_ready(&id);
            return Ok(id);
        }

        self.announce().await
    }

    fn set_ready(&self, id: &str) {
        let mut slot = self.session.write();
        slot.phase = SessionPhase::Ready;
        slot.id = Some(id.to_string());
    }

    fn forget(&self) {
        let mut slot = self.session.write();
        slot.phase = SessionPhase::Uninitialized;
        slot.id = None;
    }

    /// Open a new session, queue its `session-start` ahead of everything else
    /// and send once
    async fn announce(&self) -> Result<String> {
        let id = self.open_session().await?;

        self.queue.requeue_front(vec![session_start()]);
        let batch = self.queue.drain();
        if let Err(e) = self.api.append_events(&id, &batch).await {
            warn!(session = %id, "Initial flush failed: {}", e);
            self.queue.requeue_front(batch);
        }
        Ok(id)
    }

    /// Create a session on the server and remember its id
    async fn open_session(&self) -> Result<String> {
        self.session.write().phase = SessionPhase::Ensuring;

        let id = match self.api.create_session(self.candidate_name.as_deref()).await {
            Ok(id) => id,
            Err(e) => {
                self.session.write().phase = SessionPhase::Uninitialized;
                warn!("Failed to create session: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = self.storage.save(&id) {
            warn!(session = %id, "Failed to persist session id: {}", e);
        }
        self.set_ready(&id);
        info!(session = %id, "Session started");
        Ok(id)
    }

    /// Ship everything queued. Never overlaps another flush.
    pub async fn flush(&self) -> FlushOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("Flush already in progress");
            return FlushOutcome::Skipped;
        };

        let id = match self.ensure_locked().await {
            Ok(id) => id,
            Err(_) => return FlushOutcome::Idle,
        };

        let batch = self.queue.drain();
        if batch.is_empty() {
            return FlushOutcome::Idle;
        }
        let size = batch.len();

        match self.api.append_events(&id, &batch).await {
            Ok(_) => {
                debug!(session = %id, count = size, "Batch delivered");
                FlushOutcome::Delivered(size)
            }
            Err(e) if e.is_not_found() => {
                warn!(session = %id, "Session lost on server, recreating");
                self.forget();
                self.recreate_and_retry(batch).await
            }
            Err(e) => {
                warn!(session = %id, count = size, "Delivery failed, requeued: {}", e);
                self.queue.requeue_front(batch);
                FlushOutcome::Requeued(size)
            }
        }
    }

    /// Open a replacement session and send its `session-start` followed by
    /// the rejected batch. Events queued meanwhile wait for the next flush.
    async fn recreate_and_retry(&self, batch: Vec<Event>) -> FlushOutcome {
        let size = batch.len();
        let id = match self.open_session().await {
            Ok(id) => id,
            Err(_) => {
                self.queue.requeue_front(batch);
                return FlushOutcome::Requeued(size);
            }
        };

        let mut retry = Vec::with_capacity(size + 1);
        retry.push(session_start());
        retry.extend(batch);

        match self.api.append_events(&id, &retry).await {
            Ok(_) => FlushOutcome::Recreated { delivered: true },
            Err(e) => {
                warn!(session = %id, count = size, "Retry after recreate failed, batch dropped: {}", e);
                self.queue.requeue_front(retry.into_iter().take(1).collect());
                FlushOutcome::Recreated { delivered: false }
            }
        }
    }
}

fn session_start() -> Event {
    Event::new(EventType::SessionStart, Utc::now())
}
