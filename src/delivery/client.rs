// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Session store API client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::Event;
use crate::error::{Error, Result};
use crate::store::SessionStore;

/// The two session-store operations the delivery side needs
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Open a session, returning its id
    async fn create_session(&self, candidate_name: Option<&str>) -> Result<String>;

    /// Append a batch; `Error::NotFound` when the server forgot the session
    async fn append_events(&self, session_id: &str, events: &[Event]) -> Result<usize>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct AppendEventsRequest<'a> {
    events: &'a [Event],
}

#[derive(Debug, Deserialize)]
struct AppendEventsResponse {
    count: usize,
}

/// HTTP client for the session store
pub struct HttpSessionApi {
    http: Client,
    base_url: String,
}

impl HttpSessionApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: reqwest::Response, session_id: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(session_id.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Transport(format!("HTTP {}: {}", status.as_u16(), body)))
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn create_session(&self, candidate_name: Option<&str>) -> Result<String> {
        let url = format!("{}/session", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&CreateSessionRequest { candidate_name })
            .send()
            .await?;
        let response = Self::check(response, "").await?;
        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Failed to parse response: {}", e)))?;

        debug!(session = %body.session_id, "Session opened");
        Ok(body.session_id)
    }

    async fn append_events(&self, session_id: &str, events: &[Event]) -> Result<usize> {
        let url = format!("{}/session/{}/events", self.base_url, session_id);
        let response = self
            .http
            .post(&url)
            .json(&AppendEventsRequest { events })
            .send()
            .await?;
        let response = Self::check(response, session_id).await?;
        let body: AppendEventsResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Failed to parse response: {}", e)))?;
        Ok(body.count)
    }
}

/// In-process transport straight into a [`SessionStore`]
#[async_trait]
impl SessionApi for Arc<SessionStore> {
    async fn create_session(&self, candidate_name: Option<&str>) -> Result<String> {
        Ok(SessionStore::create_session(self, candidate_name.map(str::to_string)))
    }

    async fn append_events(&self, session_id: &str, events: &[Event]) -> Result<usize> {
        self.append_typed(session_id, events)
    }
}
