use crate::context::Transcript;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// Identifier used when only one conversation is ever open.
pub const DEFAULT_SESSION_ID: &str = "current_session";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_ID)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One isolated conversation. Owns its transcript; dropping the session
/// discards it.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    transcript: Transcript,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            transcript: Transcript::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Open sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with an empty transcript. An existing session with the
    /// same id is ended first.
    pub fn start(&mut self, id: SessionId) -> &mut Session {
        if self.sessions.remove(&id).is_some() {
            tracing::info!(session = %id, "restarting session");
        } else {
            tracing::info!(session = %id, "session started");
        }
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id))
    }

    /// End a session, handing back whatever it held.
    pub fn end(&mut self, id: &SessionId) -> Option<Session> {
        let ended = self.sessions.remove(id);
        if let Some(ref session) = ended {
            tracing::info!(
                session = %id,
                turns = session.transcript.len(),
                "session ended"
            );
        }
        ended
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
