//! Session Registry
//!
//! Tracks every live game session and which session each player sits in.
//! Finished sessions are archived out of the registry.

use std::collections::btree_map::{BTreeMap, Entry};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::ids::{PlayerId, SessionId};
use crate::game::session::{GameSession, SessionConfig, SessionError};

/// Manages all live sessions.
#[derive(Default)]
pub struct SessionRegistry {
    /// Live sessions.
    sessions: RwLock<BTreeMap<SessionId, Arc<RwLock<GameSession>>>>,
    /// Player to session mapping.
    player_sessions: RwLock<BTreeMap<PlayerId, SessionId>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session on behalf of a host.
    pub async fn create_session(
        &self,
        name: &str,
        script_name: &str,
        host_id: PlayerId,
        config: SessionConfig,
    ) -> Result<SessionId, SessionError> {
        config.validate()?;

        let session = GameSession::new(name, script_name, host_id, config);
        let id = session.id;

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Arc::new(RwLock::new(session)));
        info!("Session {} created by {}", id.short(), host_id.short());

        Ok(id)
    }

    /// Shared handle to a live session.
    pub async fn get_session(&self, id: &SessionId) -> Option<Arc<RwLock<GameSession>>> {
        self.sessions.read().await.get(id).map(Arc::clone)
    }

    /// Get session for a player.
    pub async fn get_player_session(&self, player_id: &PlayerId) -> Option<Arc<RwLock<GameSession>>> {
        let session_id = {
            let player_sessions = self.player_sessions.read().await;
            player_sessions.get(player_id).copied()
        };
        match session_id {
            Some(id) => self.get_session(&id).await,
            None => None,
        }
    }

    /// Map a player to the session they sit in.
    ///
    /// A player sits in at most one session. Re-registering with the same
    /// session is accepted; a different one is `AlreadyInSession`.
    pub async fn register_player(&self, player_id: PlayerId, session_id: SessionId) -> Result<(), SessionError> {
        if !self.sessions.read().await.contains_key(&session_id) {
            return Err(SessionError::SessionNotFound);
        }
        match self.player_sessions.write().await.entry(player_id) {
            Entry::Vacant(slot) => {
                slot.insert(session_id);
                Ok(())
            }
            Entry::Occupied(seat) if *seat.get() == session_id => Ok(()),
            Entry::Occupied(seat) => {
                debug!(
                    "Player {} already seated in {}, {} refused",
                    player_id.short(),
                    seat.get().short(),
                    session_id.short()
                );
                Err(SessionError::AlreadyInSession)
            }
        }
    }

    /// Drop a player's mapping. Returns the session they were in.
    pub async fn unregister_player(&self, player_id: &PlayerId) -> Option<SessionId> {
        self.player_sessions.write().await.remove(player_id)
    }

    /// Remove a session and its player mappings.
    pub async fn remove_session(&self, id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        drop(sessions);

        let mut player_sessions = self.player_sessions.write().await;
        player_sessions.retain(|_, session_id| session_id != id);
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Archive completed and cancelled sessions.
    ///
    /// Returns the archived sessions so the caller can persist them.
    pub async fn archive_finished(&self) -> Vec<GameSession> {
        let mut sessions = self.sessions.write().await;
        let mut finished = Vec::new();

        for (id, session) in sessions.iter() {
            let s = session.read().await;
            if s.status().is_terminal() {
                finished.push(*id);
            }
        }

        let mut archived = Vec::with_capacity(finished.len());
        for id in &finished {
            if let Some(session) = sessions.remove(id) {
                archived.push(session.read().await.clone());
            }
        }
        drop(sessions);

        if !finished.is_empty() {
            let mut player_sessions = self.player_sessions.write().await;
            player_sessions.retain(|_, session_id| !finished.contains(session_id));
            debug!("Archived {} finished sessions", finished.len());
        }

        archived
    }
}
