//! Session gate: nothing reaches the chat surface without passing through here.

use std::sync::Arc;

use log::{info, warn};

use crate::auth::{AuthProvider, AuthUser};
use crate::error::AuthError;

/// Proof that a user signed in through the gate.
///
/// Only the gate can construct one, so a host that requires it before
/// building its chat surface cannot skip authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    user: AuthUser,
}

impl Authenticated {
    pub fn user(&self) -> &AuthUser {
        &self.user
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider issued a session right away.
    Authenticated(Authenticated),
    /// The account exists but the address must be confirmed before sign-in.
    ConfirmationRequired(AuthUser),
}

#[derive(Clone)]
pub struct SessionGate {
    provider: Arc<dyn AuthProvider>,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Authenticated, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        match self.provider.sign_in(email, password).await {
            Ok(user) => {
                info!("gate opened (user_id={})", user.id);
                Ok(Authenticated { user })
            }
            Err(err) => {
                warn!("sign-in rejected: {}", err);
                Err(err)
            }
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() || confirm.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if password.as_bytes() != confirm.as_bytes() {
            return Err(AuthError::PasswordMismatch);
        }

        let result = self.provider.sign_up(email, password).await.map_err(|err| {
            warn!("sign-up rejected: {}", err);
            err
        })?;

        if result.session_issued {
            Ok(SignUpOutcome::Authenticated(Authenticated { user: result.user }))
        } else {
            info!("sign-up pending confirmation (user_id={})", result.user.id);
            Ok(SignUpOutcome::ConfirmationRequired(result.user))
        }
    }
}
