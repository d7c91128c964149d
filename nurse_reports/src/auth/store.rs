//! Per-visitor token storage.

use super::models::Session;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds the current visitor's session.
///
/// Cloning yields another handle to the same slot. Both tokens always change
/// together, so a reader never sees an access token from one session paired
/// with a refresh token from another.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    slot: Arc<RwLock<Option<Session>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(session))),
        }
    }

    pub async fn get(&self) -> Option<Session> {
        self.slot.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    pub async fn set(&self, session: Session) {
        *self.slot.write().await = Some(session);
    }

    /// Replace the session, returning the previous one
    pub async fn swap(&self, session: Session) -> Option<Session> {
        self.slot.write().await.replace(session)
    }

    pub async fn clear(&self) -> Option<Session> {
        self.slot.write().await.take()
    }

    pub async fn is_empty(&self) -> bool {
        self.slot.read().await.is_none()
    }
}
