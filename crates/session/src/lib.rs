//! Session and Identity
//!
//! - Identity provider seam with an in-memory implementation
//! - Login with profile lookup and auto-created profiles
//! - Registration
//! - Session context with an awaitable readiness signal

mod account;
mod profile;
mod provider;
mod session;

pub use account::{AccountService, LoginResponse, RegisterRequest};
pub use profile::{Actor, SessionConfig, UserProfile, USERS_COLLECTION};
pub use provider::{AuthUser, IdentityProvider, MemoryIdentityProvider};
pub use session::{Session, SignedIn};

use storage::StorageError;
use thiserror::Error;

/// Authentication error types
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use: {0}")]
    EmailInUse(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Session listener stopped")]
    SessionClosed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
