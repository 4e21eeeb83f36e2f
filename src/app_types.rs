use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::broadcast;

use crate::{preference_store::PreferenceStore, ShellEvent, SHELL_EVENT_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl RequestMethod {
    pub(crate) fn as_http(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
            RequestMethod::Patch => reqwest::Method::PATCH,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Patch => "PATCH",
        }
    }
}

/// Typed request descriptor consumed once by the request bridge. The relative
/// `url` is joined onto the configured API base before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RequestConfig {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) params: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) headers: Option<HashMap<String, String>>,
}

impl RequestConfig {
    pub(crate) fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: None,
            params: None,
            headers: None,
        }
    }
}

/// Outcome of a bridged request: exactly one of `data` or `error`, never both.
/// All failures come back as values so the bridge never raises to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RequestResult {
    Success { data: Value, status: u16 },
    Failure { error: String, status: u16 },
}

/// Deferred write recorded while offline, replayed in insertion order on sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct OfflineQueueEntry {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct SyncReport {
    pub(crate) attempted: usize,
    pub(crate) failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyncBridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
    pub(crate) attempted: usize,
    pub(crate) failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateCheckResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
    pub(crate) current_version: String,
    pub(crate) latest_version: Option<String>,
    pub(crate) has_update: bool,
}

/// Handles shared by the privileged context. Owned by the process lifecycle
/// controller; bridge command handlers and background tasks borrow it.
pub(crate) struct AppContext {
    pub(crate) preferences: PreferenceStore,
    pub(crate) http: reqwest::Client,
    pub(crate) shell_events: broadcast::Sender<ShellEvent>,
    pub(crate) sync_in_progress: AtomicBool,
}

impl AppContext {
    pub(crate) fn new(preferences: PreferenceStore) -> Self {
        let (shell_events, _) = broadcast::channel(SHELL_EVENT_CAPACITY);
        Self {
            preferences,
            http: reqwest::Client::new(),
            shell_events,
            sync_in_progress: AtomicBool::new(false),
        }
    }

    pub(crate) fn subscribe_shell_events(&self) -> broadcast::Receiver<ShellEvent> {
        self.shell_events.subscribe()
    }
}

pub(crate) struct AtomicFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AtomicFlagGuard<'a> {
    pub(crate) fn try_set(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for AtomicFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
