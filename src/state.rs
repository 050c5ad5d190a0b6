//! Application state
//!
//! Signed-in user and profile, shared by reference with everything that
//! needs them. Changes are published on a watch channel.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::models::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("No active user. Call select_user first or pass user_id explicitly.")]
    NoActiveUser,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_user: Option<String>,
    pub profile: Option<Profile>,
    pub initialized: bool,
}

/// Session state with update/subscribe semantics
#[derive(Clone)]
pub struct AppState {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl AppState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every later change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Switch the active user. A different user, or none, drops the cached profile.
    pub fn set_session(&self, user_id: Option<String>) {
        self.tx.send_modify(|state| {
            if state.session_user != user_id {
                state.profile = None;
            }
            state.session_user = user_id;
        });
        tracing::debug!("session changed");
    }

    pub fn set_profile(&self, profile: Option<Profile>) {
        self.tx.send_modify(|state| state.profile = profile);
    }

    pub fn set_initialized(&self, initialized: bool) {
        self.tx.send_modify(|state| state.initialized = initialized);
    }

    /// The explicit user if given, else the active session user
    pub fn resolve_user(&self, explicit: Option<&str>) -> Result<String, StateError> {
        if let Some(user) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(user.to_string());
        }
        self.tx
            .borrow()
            .session_user
            .clone()
            .ok_or(StateError::NoActiveUser)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            full_name: Some("Jon Doe".into()),
            username: None,
            avatar_url: None,
            role: None,
            coach_id: None,
            email: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_resolve_user() {
        let state = AppState::new();
        assert_eq!(state.resolve_user(None), Err(StateError::NoActiveUser));
        assert_eq!(state.resolve_user(Some("u-2")), Ok("u-2".to_string()));

        state.set_session(Some("u-1".into()));
        assert_eq!(state.resolve_user(None), Ok("u-1".to_string()));
        assert_eq!(state.resolve_user(Some("  ")), Ok("u-1".to_string()));
        assert_eq!(state.resolve_user(Some("u-2")), Ok("u-2".to_string()));
    }

    #[test]
    fn test_switching_user_drops_profile() {
        let state = AppState::new();
        state.set_session(Some("u-1".into()));
        state.set_profile(Some(profile("u-1")));

        state.set_session(Some("u-1".into()));
        assert!(state.snapshot().profile.is_some());

        state.set_session(Some("u-2".into()));
        assert!(state.snapshot().profile.is_none());

        state.set_profile(Some(profile("u-2")));
        state.set_session(None);
        assert_eq!(state.snapshot(), SessionSnapshot::default());
    }

    #[test]
    fn test_clones_share_state() {
        let state = AppState::new();
        let other = state.clone();
        other.set_initialized(true);
        assert!(state.snapshot().initialized);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let state = AppState::new();
        let mut rx = state.subscribe();

        state.set_session(Some("u-1".into()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().session_user.as_deref(), Some("u-1"));

        state.set_profile(Some(profile("u-1")));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().profile.as_ref().map(|p| p.id.as_str()), Some("u-1"));
    }
}
