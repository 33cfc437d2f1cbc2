//! Session context
//!
//! Tracks the signed-in identity and its profile. Construct one per
//! application and pass it to the code that needs the current user;
//! await [`Session::ready`] before deciding whether anyone is signed in.

use crate::profile::{Actor, SessionConfig, UserProfile, USERS_COLLECTION};
use crate::provider::{AuthUser, IdentityProvider};
use crate::AuthError;
use std::sync::{Arc, Mutex};
use storage::DocumentStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Signed-in identity and its profile, if one exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub user: AuthUser,
    pub profile: Option<UserProfile>,
}

/// Session state; `None` until the first auth state has been processed
type State = Option<Option<SignedIn>>;

struct SessionInner {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<State>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    config: SessionConfig,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

/// Current user context, cheap to clone
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Start following the provider's sign-in state.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(None);
        let state = Arc::new(state);
        let handle = tokio::spawn(follow_auth_state(
            provider.auth_state(),
            store,
            state.clone(),
        ));

        Self {
            inner: Arc::new(SessionInner {
                provider,
                state,
                listener: Mutex::new(Some(handle)),
                config,
            }),
        }
    }

    /// Wait until the sign-in state is known and return it
    pub async fn ready(&self) -> Result<Option<SignedIn>, AuthError> {
        let mut receiver = self.inner.state.subscribe();
        let state = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| AuthError::SessionClosed)?;
        Ok(state.clone().flatten())
    }

    /// Whether the first sign-in state has been processed
    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    fn signed_in(&self) -> Option<SignedIn> {
        self.inner.state.borrow().clone().flatten()
    }

    pub fn is_authenticated(&self) -> bool {
        self.signed_in().is_some()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.signed_in().map(|s| s.user)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.signed_in().and_then(|s| s.profile)
    }

    /// Profile role, or the configured fallback role
    pub fn role(&self) -> String {
        self.profile()
            .map(|p| p.role)
            .filter(|role| !role.is_empty())
            .unwrap_or_else(|| self.inner.config.fallback_role.clone())
    }

    /// Profile name, else e-mail, else `"User"`
    pub fn user_name(&self) -> String {
        let Some(signed_in) = self.signed_in() else {
            return "User".to_string();
        };
        signed_in
            .profile
            .map(|p| p.name)
            .filter(|name| !name.is_empty())
            .or(signed_in.user.email)
            .unwrap_or_else(|| "User".to_string())
    }

    /// Acting user for record stamping
    pub fn actor(&self) -> Option<Actor> {
        let user = self.current_user()?;
        Some(Actor {
            user_id: user.uid,
            user_name: self.user_name(),
        })
    }

    /// Fresh bearer token for the signed-in user
    pub async fn token(&self) -> Result<String, AuthError> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        self.inner.provider.id_token(&user).await
    }

    /// Sign out and clear the cached user immediately
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.inner.provider.sign_out().await?;
        self.inner.state.send_replace(Some(None));
        info!("Session signed out");
        Ok(())
    }
}

async fn follow_auth_state(
    mut auth: watch::Receiver<Option<AuthUser>>,
    store: Arc<dyn DocumentStore>,
    state: Arc<watch::Sender<State>>,
) {
    loop {
        let user = auth.borrow_and_update().clone();
        let signed_in = user.map(|user| {
            let profile = load_profile(store.as_ref(), &user.uid);
            SignedIn { user, profile }
        });
        debug!("Auth state changed: signed in = {}", signed_in.is_some());
        state.send_replace(Some(signed_in));

        if auth.changed().await.is_err() {
            debug!("Identity provider closed, session listener stopping");
            break;
        }
    }
}

fn load_profile(store: &dyn DocumentStore, uid: &str) -> Option<UserProfile> {
    match store.get(USERS_COLLECTION, uid) {
        Ok(Some(doc)) => doc
            .decode()
            .map_err(|e| error!("Error decoding user profile {}: {}", uid, e))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            error!("Error fetching user profile {}: {}", uid, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryIdentityProvider;
    use serde_json::json;
    use std::time::Duration;
    use storage::MemoryStore;

    fn start() -> (Session, Arc<MemoryIdentityProvider>, MemoryStore) {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let store = MemoryStore::new();
        let session = Session::start(provider.clone(), Arc::new(store.clone()), SessionConfig::default());
        (session, provider, store)
    }

    async fn wait_until(session: &Session, check: impl Fn(&Session) -> bool) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while !check(session) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("session state reached");
    }

    #[tokio::test]
    async fn test_ready_resolves_signed_out() {
        let (session, _, _) = start();
        let state = session.ready().await.unwrap();
        assert!(state.is_none());
        assert!(session.is_ready());
        assert!(!session.is_authenticated());
        assert_eq!(session.role(), "viewer");
        assert_eq!(session.user_name(), "User");
        assert!(session.actor().is_none());
    }

    #[tokio::test]
    async fn test_follows_sign_in_with_profile() {
        let (session, provider, store) = start();
        session.ready().await.unwrap();

        let user = provider.create_user("lee@shop.com", "secret1").await.unwrap();
        store
            .set(
                "users",
                &user.uid,
                json!({ "name": "Lee", "role": "manager", "email": "lee@shop.com" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        // Re-emit so the listener sees the profile written after sign-up
        provider.sign_out().await.unwrap();
        provider.sign_in("lee@shop.com", "secret1").await.unwrap();

        wait_until(&session, |s| s.role() == "manager").await;
        assert!(session.is_authenticated());
        assert_eq!(session.user_name(), "Lee");
        let actor = session.actor().unwrap();
        assert_eq!(actor.user_id, user.uid);
        assert!(!session.token().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_name_falls_back_to_email() {
        let (session, provider, _) = start();
        provider.create_user("sam@shop.com", "secret1").await.unwrap();
        wait_until(&session, Session::is_authenticated).await;
        assert_eq!(session.user_name(), "sam@shop.com");
        assert_eq!(session.role(), "viewer");
    }

    #[tokio::test]
    async fn test_logout_clears_immediately() {
        let (session, provider, _) = start();
        provider.create_user("sam@shop.com", "secret1").await.unwrap();
        wait_until(&session, Session::is_authenticated).await;

        session.logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert!(matches!(session.token().await, Err(AuthError::NotSignedIn)));
    }
}
