//! Ephemeral form store: the latest persona and content-generation submissions.
//!
//! Each submission replaces its slot wholesale; nothing is merged. Slots are
//! keyed by session so clients that send `X-Session-Id` never see each other's
//! data. Clients that omit the header share the `default` session, where the
//! most recent submission from anyone wins. The number of sessions is
//! bounded by `MAX_SESSIONS`.

pub mod handlers;

use std::collections::HashMap;
use std::sync::RwLock;

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use tracing::debug;

pub const SESSION_HEADER: &str = "x-session-id";
pub const DEFAULT_SESSION: &str = "default";

/// A submitted form: arbitrary keys, values kept in submission order.
pub type FormPayload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Persona,
    Content,
}

/// Upper bound on distinct sessions kept in memory.
pub const MAX_SESSIONS: usize = 1024;

#[derive(Debug, Default)]
struct SessionForms {
    persona: FormPayload,
    content: FormPayload,
    /// Write sequence number of the latest save; lowest is evicted first.
    last_write: u64,
}

impl SessionForms {
    fn slot(&self, kind: FormKind) -> &FormPayload {
        match kind {
            FormKind::Persona => &self.persona,
            FormKind::Content => &self.content,
        }
    }

    fn slot_mut(&mut self, kind: FormKind) -> &mut FormPayload {
        match kind {
            FormKind::Persona => &mut self.persona,
            FormKind::Content => &mut self.content,
        }
    }
}

#[derive(Debug, Default)]
struct Sessions {
    forms: HashMap<String, SessionForms>,
    writes: u64,
}

/// Process-lifetime, in-memory store. Holds at most `capacity` sessions; the
/// least recently written one is dropped to make room. The `default` session
/// is never evicted.
#[derive(Debug)]
pub struct FormStore {
    sessions: RwLock<Sessions>,
    capacity: usize,
}

impl Default for FormStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            capacity: capacity.max(1),
        }
    }

    /// Replaces the whole slot for `(session, kind)` with `payload`.
    pub fn save(&self, kind: FormKind, session: &str, payload: FormPayload) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !sessions.forms.contains_key(session) && sessions.forms.len() >= self.capacity {
            let oldest = sessions
                .forms
                .iter()
                .filter(|(key, _)| key.as_str() != DEFAULT_SESSION)
                .min_by_key(|(_, forms)| forms.last_write)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                debug!("Evicting form session '{}'", key);
                sessions.forms.remove(&key);
            }
        }

        sessions.writes += 1;
        let write = sessions.writes;
        let forms = sessions.forms.entry(session.to_string()).or_default();
        forms.last_write = write;
        *forms.slot_mut(kind) = payload;
    }

    /// Returns a copy of the slot, empty if nothing was ever saved.
    pub fn get(&self, kind: FormKind, session: &str) -> FormPayload {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions
            .forms
            .get(session)
            .map(|forms| forms.slot(kind).clone())
            .unwrap_or_default()
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .forms
            .len()
    }
}

/// Reads the session key from request headers, falling back to the shared session.
pub fn session_key(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}
