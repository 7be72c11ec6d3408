//! # Session
//!
//! Tracks who is signed in and whether they are an administrator.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session::start(provider, profiles)                                     │
//! │       │                                                                 │
//! │       ├── read current identity ──► role_of(id) ──► is_admin            │
//! │       │                                                         │       │
//! │       └── spawn listener ◄── provider identity changes          │       │
//! │                 │                                               │       │
//! │                 └── on change: loading, role_of(id), publish ◄──┘       │
//! │                                                                         │
//! │  snapshot()   { identity, is_admin, loading }                           │
//! │  sign_out()   provider signs out, identity and admin cleared            │
//! │  stop()/drop  listener aborted (unsubscribe)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed role lookup never fails the session: it is logged and the user
//! is treated as a non-admin.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use clinic_core::Role;

use crate::repository::ProfileRepository;

// =============================================================================
// Identity Provider
// =============================================================================

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// Source of the authenticated identity.
///
/// The hosted auth service, or a local stand-in, implements this. Changes
/// are published on a `watch` channel holding the current identity.
pub trait IdentityProvider: Send + Sync {
    /// Identity signed in right now, if any.
    fn current(&self) -> Option<Identity>;

    /// Subscribes to identity changes.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// Ends the provider-side session.
    fn sign_out(&self);
}

/// In-process identity provider backed by a watch channel.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    tx: watch::Sender<Option<Identity>>,
}

impl LocalIdentityProvider {
    /// Creates a provider with nobody signed in.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        LocalIdentityProvider { tx }
    }

    /// Signs an identity in, replacing the previous one.
    pub fn sign_in(&self, identity: Identity) {
        debug!(identity = %identity.id, "Identity signed in");
        self.tx.send_replace(Some(identity));
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    fn sign_out(&self) {
        self.tx.send_replace(None);
    }
}

// =============================================================================
// Session
// =============================================================================

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub is_admin: bool,
    /// True while the role of a new identity is being resolved.
    pub loading: bool,
}

/// Explicit session object owning the identity listener.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<SessionSnapshot>,
    listener: Option<JoinHandle<()>>,
}

impl Session {
    /// Starts a session: resolves the current identity's role and begins
    /// listening for identity changes.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(provider: Arc<dyn IdentityProvider>, profiles: ProfileRepository) -> Self {
        let mut changes = provider.subscribe();
        changes.borrow_and_update();

        let identity = provider.current();
        let (state, _rx) = watch::channel(SessionSnapshot {
            identity: identity.clone(),
            is_admin: false,
            loading: true,
        });

        let is_admin = resolve_admin(&profiles, identity.as_ref()).await;
        state.send_modify(|s| {
            s.is_admin = is_admin;
            s.loading = false;
        });

        info!(
            identity = identity.as_ref().map(|i| i.id.as_str()).unwrap_or("-"),
            is_admin = is_admin,
            "Session started"
        );

        let listener = tokio::spawn(listen(changes, state.clone(), profiles));

        Session {
            provider,
            state,
            listener: Some(listener),
        }
    }

    /// Returns the current session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Signs out: the provider ends its session and the local state is
    /// cleared right away.
    pub fn sign_out(&self) {
        self.provider.sign_out();
        self.state.send_modify(|s| {
            s.identity = None;
            s.is_admin = false;
            s.loading = false;
        });
        info!("Signed out");
    }

    /// Stops listening for identity changes. Idempotent.
    pub fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            debug!("Session listener stopped");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn listen(
    mut changes: watch::Receiver<Option<Identity>>,
    state: watch::Sender<SessionSnapshot>,
    profiles: ProfileRepository,
) {
    while changes.changed().await.is_ok() {
        let identity = changes.borrow_and_update().clone();

        state.send_modify(|s| {
            s.identity = identity.clone();
            s.loading = true;
        });

        let is_admin = resolve_admin(&profiles, identity.as_ref()).await;

        // A sign-out or a newer identity may have landed during the lookup.
        let published = state.send_if_modified(|s| {
            if s.identity != identity {
                return false;
            }
            s.is_admin = is_admin;
            s.loading = false;
            true
        });

        if published {
            debug!(is_admin = is_admin, "Session identity changed");
        } else {
            debug!("Discarded role lookup for a superseded identity");
        }
    }
}

async fn resolve_admin(profiles: &ProfileRepository, identity: Option<&Identity>) -> bool {
    let Some(identity) = identity else {
        return false;
    };

    match profiles.role_of(&identity.id).await {
        Ok(role) => role == Some(Role::Admin),
        Err(e) => {
            warn!(identity = %identity.id, error = %e, "Role lookup failed, treating as non-admin");
            false
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use std::time::Duration;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            email: format!("{}@clinica.com", id),
        }
    }

    async fn setup() -> (Database, Arc<LocalIdentityProvider>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.profiles().upsert("owner", "owner@clinica.com", Role::Admin).await.unwrap();
        db.profiles().upsert("staff", "staff@clinica.com", Role::User).await.unwrap();
        (db, Arc::new(LocalIdentityProvider::new()))
    }

    async fn wait_until(session: &Session, done: impl Fn(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let mut rx = session.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                if done(&snapshot) {
                    return snapshot;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_resolves_admin() {
        let (db, provider) = setup().await;
        provider.sign_in(identity("owner"));

        let session = Session::start(provider.clone(), db.profiles()).await;
        let snapshot = session.snapshot();

        assert_eq!(snapshot.identity, Some(identity("owner")));
        assert!(snapshot.is_admin);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_start_without_identity() {
        let (db, provider) = setup().await;

        let session = Session::start(provider, db.profiles()).await;
        assert_eq!(session.snapshot(), SessionSnapshot::default());
    }

    #[tokio::test]
    async fn test_identity_change_updates_role() {
        let (db, provider) = setup().await;
        provider.sign_in(identity("owner"));
        let session = Session::start(provider.clone(), db.profiles()).await;

        provider.sign_in(identity("staff"));
        let snapshot = wait_until(&session, |s| {
            s.identity.as_ref().map(|i| i.id.as_str()) == Some("staff") && !s.loading
        })
        .await;
        assert!(!snapshot.is_admin);

        provider.sign_in(identity("owner"));
        let snapshot = wait_until(&session, |s| s.is_admin && !s.loading).await;
        assert_eq!(snapshot.identity, Some(identity("owner")));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_admin() {
        let (db, provider) = setup().await;
        provider.sign_in(identity("owner"));
        db.close().await;

        let session = Session::start(provider, db.profiles()).await;
        let snapshot = session.snapshot();

        assert_eq!(snapshot.identity, Some(identity("owner")));
        assert!(!snapshot.is_admin);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_sign_out_clears_state() {
        let (db, provider) = setup().await;
        provider.sign_in(identity("owner"));
        let session = Session::start(provider.clone(), db.profiles()).await;

        session.sign_out();

        assert_eq!(provider.current(), None);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.identity, None);
        assert!(!snapshot.is_admin);
    }

    #[tokio::test]
    async fn test_sign_out_during_lookup_keeps_admin_cleared() {
        let (db, provider) = setup().await;
        let mut session = Session::start(provider.clone(), db.profiles()).await;

        provider.sign_in(identity("owner"));
        session.sign_out();

        // The listener may still process "owner" after the local clear; the
        // final state must not report an admin without an identity.
        let snapshot = wait_until(&session, |s| s.identity.is_none() && !s.loading).await;
        assert!(!snapshot.is_admin);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.identity, None);
        assert!(!snapshot.is_admin);
        session.stop();
    }

    #[tokio::test]
    async fn test_stop_unsubscribes() {
        let (db, provider) = setup().await;
        provider.sign_in(identity("staff"));
        let mut session = Session::start(provider.clone(), db.profiles()).await;

        session.stop();
        session.stop();
        provider.sign_in(identity("owner"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.identity, Some(identity("staff")));
        assert!(!snapshot.is_admin);
    }
}
