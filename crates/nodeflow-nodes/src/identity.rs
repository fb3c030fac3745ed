//! Caller identity
//!
//! Nodes that write on behalf of a user ask an [`IdentityProvider`] who that
//! user is. Anonymous callers are rejected with [`IdentityError::Unauthorized`].

use async_trait::async_trait;
use thiserror::Error;

/// Identity lookup failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No authenticated user
    #[error("Unauthorized: no authenticated user")]
    Unauthorized,
}

/// Resolves the current user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Id of the authenticated user
    async fn current_user_id(&self) -> Result<String, IdentityError>;
}

/// Identity fixed at construction time
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    /// Authenticated as `user_id`
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// Not authenticated
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user_id(&self) -> Result<String, IdentityError> {
        self.user_id.clone().ok_or(IdentityError::Unauthorized)
    }
}
