//! Process-wide upstream session.
//!
//! There is exactly one session per process. It is shared by handle
//! (`Arc<SessionStore>`) between the broker that fills it and the
//! components that read it.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio::sync::RwLock;

use crate::error::{BridgeError, Result};

/// Snapshot of the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub org_id: Option<String>,
}

/// Holds the access token and organization id (read-heavy, write-rare).
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both session fields.
    pub async fn set_session(&self, access_token: String, org_id: Option<String>) {
        *self.inner.write().await = Session {
            access_token: Some(access_token),
            org_id,
        };
    }

    /// Record the organization resolved after login.
    pub async fn set_org_id(&self, org_id: String) {
        self.inner.write().await.org_id = Some(org_id);
    }

    /// Authorization header for the current token.
    pub async fn auth_headers(&self) -> Result<HeaderMap> {
        let guard = self.inner.read().await;
        let token = guard
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(BridgeError::AuthenticationRequired)?;

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| BridgeError::AuthenticationRequired)?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Current organization id, if the post-login lookup succeeded.
    pub async fn org_id(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .org_id
            .clone()
            .filter(|id| !id.is_empty())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth_headers().await.is_ok()
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.clone()
    }
}
