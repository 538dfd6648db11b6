pub mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub use supabase::SupabaseAuth;

/// A user as reported by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    pub user: AuthUser,
    /// False when the service wants the address confirmed before sign-in.
    pub session_issued: bool,
}

/// An external service that validates and creates user credentials.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError>;
}
