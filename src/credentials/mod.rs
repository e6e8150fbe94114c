//! Access credentials shared by the download workers of a batch
//!
//! - [`SharedCredential`] is the single cross-task mutable value of a batch:
//!   the refresher writes it, workers read the current access token per request.
//! - [`CredentialStore`] loads and persists credentials by session.
//! - [`TokenRefresher`] exchanges a refresh token for a new access token.
//! - [`spawn_credential_refresher`] runs the periodic renewal bound to a batch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{Credential, SessionId};

mod oauth;
mod refresher;

pub use oauth::OAuthTokenRefresher;
pub use refresher::{CredentialRefresherParams, RefresherHandle, spawn_credential_refresher};

/// Persistent credential storage keyed by session
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credential stored for `session`
    async fn credential(&self, session: &SessionId) -> Result<Credential>;

    /// Store a renewed credential for `session`
    async fn persist_refreshed(&self, session: &SessionId, credential: &Credential) -> Result<()>;
}

/// Identity-provider client that renews access tokens
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange the refresh token of `credential` for a new access token
    async fn refresh(&self, credential: &Credential) -> Result<Credential>;
}

/// Credential readable by many workers and replaceable by the refresher
#[derive(Clone, Debug)]
pub struct SharedCredential(Arc<RwLock<Credential>>);

impl SharedCredential {
    /// Wrap a credential for sharing
    pub fn new(credential: Credential) -> Self {
        Self(Arc::new(RwLock::new(credential)))
    }

    /// Current access token
    pub async fn access_token(&self) -> String {
        self.0.read().await.access_token.clone()
    }

    /// Copy of the current credential
    pub async fn snapshot(&self) -> Credential {
        self.0.read().await.clone()
    }

    /// Replace the credential; readers see the new token on their next request
    pub async fn replace(&self, credential: Credential) {
        *self.0.write().await = credential;
    }
}
