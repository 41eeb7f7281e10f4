//! Registry supervisor (component K).
//!
//! A process-wide map from session id to a running [`SessionController`]'s
//! mailbox handle. Creates a controller on first attach for a session id;
//! the controller itself owns draining and death once its last client
//! leaves, so the supervisor's remaining job is pruning the map entry once
//! that controller's actor task actually finishes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{CoreError, CoreResult};
use crate::session::controller::{ControllerHandle, SessionController, SpawnSpec};

/// Global keyed map `sessionId -> SessionController`, safe to share and
/// clone across every client-handling task.
#[derive(Clone, Default)]
pub struct Supervisor {
    sessions: Arc<Mutex<HashMap<String, ControllerHandle>>>,
}

impl Supervisor {
    /// Creates an empty supervisor with no running sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the controller for `session_id`, spawning one
    /// via `spec` if none currently exists. The second element of the
    /// returned pair is `true` exactly when a new controller was
    /// spawned, so a fresh `ServerFrame::NewSession` can be announced to
    /// the requesting client.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SessionNotFound`] if no controller exists for
    /// `session_id` and one could not be spawned (e.g. the multiplexer
    /// binary failed to start).
    pub fn attach(
        &self,
        session_id: &str,
        spec: impl FnOnce() -> SpawnSpec,
    ) -> CoreResult<(ControllerHandle, bool)> {
        let mut sessions = self.sessions.lock().expect("supervisor lock poisoned");
        if let Some(handle) = sessions.get(session_id) {
            return Ok((handle.clone(), false));
        }

        let (handle, task) = SessionController::spawn(session_id.to_string(), spec())
            .map_err(|err| CoreError::SessionNotFound(format!("{session_id}: {err}")))?;
        sessions.insert(session_id.to_string(), handle.clone());
        drop(sessions);

        self.spawn_reaper(session_id.to_string(), task);
        log::info!("supervisor: session {session_id} created");
        Ok((handle, true))
    }

    /// Looks up an already-running controller without creating one.
    #[must_use]
    pub fn lookup(&self, session_id: &str) -> Option<ControllerHandle> {
        self.sessions.lock().expect("supervisor lock poisoned").get(session_id).cloned()
    }

    /// Number of currently tracked sessions. Exposed for tests and
    /// introspection; not part of the hot attach/detach path.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.lock().expect("supervisor lock poisoned").len()
    }

    /// Awaits the controller's actor task in the background and removes
    /// its entry from the map once it finishes, so a subsequent attach
    /// for the same session id spawns a fresh controller instead of
    /// handing out a handle to a dead mailbox.
    fn spawn_reaper(&self, session_id: String, task: tokio::task::JoinHandle<()>) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            if let Err(err) = task.await {
                log::warn!("session {session_id} actor task panicked: {err}");
            }
            sessions.lock().expect("supervisor lock poisoned").remove(&session_id);
            log::info!("supervisor: session {session_id} reaped");
        });
    }
}
