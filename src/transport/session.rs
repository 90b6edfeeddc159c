// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::mcp::McpServer;

/// Frames buffered per subscriber before a push has to wait.
const SESSION_CHANNEL_CAPACITY: usize = 32;

/// One live SSE connection: the server instance answering its posted messages
/// and the channel feeding its event stream.
#[derive(Clone)]
pub struct SseSession {
    id: String,
    server: McpServer,
    tx: mpsc::Sender<String>,
}

impl SseSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn server(&self) -> &McpServer {
        &self.server
    }

    /// Queues one serialized frame for the event stream. Fails once the
    /// subscriber is gone.
    pub async fn push(&self, payload: String) -> Result<(), mpsc::error::SendError<String>> {
        self.tx.send(payload).await
    }
}

/// Sessions created on SSE subscribe, addressed by the `sessionId` query
/// parameter on the message endpoint.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SseSession>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a fresh session under a random id. The returned guard
    /// unregisters it when the event stream is dropped, whichever way the
    /// connection ends.
    pub fn create(
        self: &Arc<Self>,
        server: McpServer,
    ) -> (SseSession, mpsc::Receiver<String>, SessionGuard) {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let session = SseSession {
            id: Uuid::new_v4().to_string(),
            server,
            tx,
        };

        self.lock().insert(session.id.clone(), session.clone());
        let guard = SessionGuard {
            registry: Arc::clone(self),
            id: session.id.clone(),
        };

        (session, rx, guard)
    }

    pub fn lookup(&self, id: &str) -> Option<SseSession> {
        self.lock().get(id).cloned()
    }

    /// Removes one session; calling it again for the same id is a no-op.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Drops every session. Live event streams end because the senders feeding
    /// them go away with their sessions.
    pub fn clear(&self) {
        let drained = {
            let mut sessions = self.lock();
            let drained = sessions.len();
            sessions.clear();
            drained
        };
        if drained > 0 {
            tracing::debug!(sessions = drained, "cleared sse sessions");
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SseSession>> {
        self.sessions.lock().expect("session registry lock poisoned")
    }
}

/// Unregisters its session on drop so every disconnect path cleans up exactly
/// once.
pub struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.registry.remove(&self.id) {
            tracing::debug!(session_id = %self.id, "sse session closed");
        }
    }
}
