//! Identity providers

use crate::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

/// Minimum password length accepted by [`MemoryIdentityProvider`]
const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

/// Source of identities and sign-in state
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with e-mail and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Create an identity and sign it in
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Sign the current identity out
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Bearer token for `user`
    async fn id_token(&self, user: &AuthUser) -> Result<String, AuthError>;

    /// Currently signed-in identity
    fn current_user(&self) -> Option<AuthUser>;

    /// Sign-in state; the current value is the first known state
    fn auth_state(&self) -> watch::Receiver<Option<AuthUser>>;
}

struct Account {
    uid: String,
    email: String,
    password: String,
}

/// Identity provider kept in memory (tests and local runs)
pub struct MemoryIdentityProvider {
    /// Accounts keyed by lowercase e-mail
    accounts: Mutex<HashMap<String, Account>>,
    /// Issued tokens and their uid
    tokens: Mutex<HashMap<String, String>>,
    state: watch::Sender<Option<AuthUser>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        info!("Creating in-memory identity provider");
        let (state, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            state,
        }
    }

    /// uid a token was issued for
    pub fn verify_token(&self, token: &str) -> Option<String> {
        self.tokens.lock().ok()?.get(token).cloned()
    }

    fn signed_in(&self, user: AuthUser) -> AuthUser {
        self.state.send_replace(Some(user.clone()));
        user
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> AuthError {
    AuthError::Storage(storage::StorageError::DatabaseError(format!("Lock error: {}", e)))
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = {
            let accounts = self.accounts.lock().map_err(lock_error)?;
            let account = accounts
                .get(&email.trim().to_lowercase())
                .filter(|a| a.password == password)
                .ok_or(AuthError::InvalidCredentials)?;
            AuthUser {
                uid: account.uid.clone(),
                email: Some(account.email.clone()),
            }
        };
        debug!("Signed in {}", user.uid);
        Ok(self.signed_in(user))
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let user = {
            let mut accounts = self.accounts.lock().map_err(lock_error)?;
            let key = email.to_lowercase();
            if accounts.contains_key(&key) {
                return Err(AuthError::EmailInUse(email.to_string()));
            }
            let account = Account {
                uid: Uuid::new_v4().simple().to_string(),
                email: email.to_string(),
                password: password.to_string(),
            };
            let user = AuthUser {
                uid: account.uid.clone(),
                email: Some(account.email.clone()),
            };
            accounts.insert(key, account);
            user
        };
        info!("Created identity {}", user.uid);
        Ok(self.signed_in(user))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.send_replace(None);
        Ok(())
    }

    async fn id_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .lock()
            .map_err(lock_error)?
            .insert(token.clone(), user.uid.clone());
        Ok(token)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    fn auth_state(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }
}
