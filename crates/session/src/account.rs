//! Login, registration and logout

use crate::profile::{SessionConfig, UserProfile, USERS_COLLECTION};
use crate::provider::{AuthUser, IdentityProvider};
use crate::AuthError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{to_fields, DocumentStore};
use tracing::{error, info, warn};

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub user_id: String,
}

/// Self-registration form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub pin: String,
}

/// Sign-in and account creation against an identity provider and the
/// `users` collection
#[derive(Clone)]
pub struct AccountService {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    config: SessionConfig,
}

impl AccountService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Sign in and resolve the user's display name and role.
    ///
    /// Profile lookup problems never fail the login: defaults are used
    /// and a missing profile is created.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let user = self.provider.sign_in(email, password).await?;
        let token = self.provider.id_token(&user).await?;

        let mut role = self.config.default_role.clone();
        let mut name = user.email.clone().unwrap_or_else(|| "User".to_string());

        match self.store.get(USERS_COLLECTION, &user.uid) {
            Ok(Some(doc)) => match doc.decode::<UserProfile>() {
                Ok(profile) => {
                    if !profile.role.is_empty() {
                        role = profile.role;
                    }
                    if !profile.name.is_empty() {
                        name = profile.name;
                    }
                }
                Err(e) => warn!("Could not read user profile {}: {}", user.uid, e),
            },
            Ok(None) => {
                warn!("User profile missing for {}, creating it", user.uid);
                self.create_missing_profile(&user, &name, &role);
            }
            Err(e) => warn!("Could not fetch user profile {}: {}", user.uid, e),
        }

        info!("User {} logged in with role {}", user.uid, role);
        Ok(LoginResponse {
            token,
            email: user.email.unwrap_or_default(),
            name,
            role,
            user_id: user.uid,
        })
    }

    fn create_missing_profile(&self, user: &AuthUser, name: &str, role: &str) {
        let profile = UserProfile {
            name: name.to_string(),
            email: user.email.clone().unwrap_or_default(),
            role: role.to_string(),
            pin: None,
            disabled: false,
            created_at: Some(now()),
        };

        let result = to_fields(&profile)
            .and_then(|fields| self.store.set(USERS_COLLECTION, &user.uid, fields));
        match result {
            Ok(()) => info!("User profile auto-created for {}", user.uid),
            Err(e) => error!("Failed to auto-create user profile {}: {}", user.uid, e),
        }
    }

    /// Create an identity and its profile document
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthUser, AuthError> {
        let user = self
            .provider
            .create_user(&request.email, &request.password)
            .await?;

        let profile = UserProfile {
            name: request.name.clone(),
            email: request.email.clone(),
            role: self.config.registration_role.clone(),
            pin: Some(request.pin.clone()),
            disabled: false,
            created_at: Some(now()),
        };
        self.store
            .set(USERS_COLLECTION, &user.uid, to_fields(&profile)?)?;

        info!("Registered {} as {}", user.uid, profile.role);
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
