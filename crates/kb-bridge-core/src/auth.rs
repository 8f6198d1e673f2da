//! Password login against the identity service.
//!
//! Identity tokens do not carry the organization, so a successful login is
//! followed by an organization lookup whose result is stored alongside the
//! token. Only sync needs it; a failed lookup is logged and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::UpstreamConfig;
use crate::error::Result;
use crate::session::SessionStore;
use crate::upstream;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Password grant body.
#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
    gotrue_meta_security: GotrueMetaSecurity,
}

/// Always sent empty.
#[derive(Serialize)]
struct GotrueMetaSecurity {}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct CurrentOrganization {
    org_id: String,
}

/// Establishes the process session.
pub struct CredentialBroker {
    http: Client,
    config: Arc<UpstreamConfig>,
    session: Arc<SessionStore>,
}

impl CredentialBroker {
    pub fn new(http: Client, config: Arc<UpstreamConfig>, session: Arc<SessionStore>) -> Self {
        Self {
            http,
            config,
            session,
        }
    }

    /// Log in with email and password.
    ///
    /// Returns the access token, or `None` when the identity service rejects
    /// the credentials. A failed login leaves the previous session in place.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>> {
        let identity_url = self.config.identity_url()?;
        let api_key = self.config.api_key()?;

        let request = self
            .http
            .post(format!("{}/auth/v1/token", identity_url))
            .query(&[("grant_type", "password")])
            .header("Apikey", api_key)
            .timeout(LOGIN_TIMEOUT)
            .json(&PasswordGrant {
                email,
                password,
                gotrue_meta_security: GotrueMetaSecurity {},
            });

        let Some(resp) = upstream::dispatch("Login", request, &[StatusCode::OK]).await else {
            return Ok(None);
        };

        let token = upstream::decode::<TokenResponse>("Login", resp)
            .await
            .map(|t| t.access_token)
            .filter(|t| !t.is_empty());
        let Some(token) = token else {
            return Ok(None);
        };

        self.session.set_session(token.clone(), None).await;
        info!("Login successful");

        self.resolve_org_id().await;

        Ok(Some(token))
    }

    /// Look up the caller's organization with the fresh token.
    async fn resolve_org_id(&self) {
        let backend_url = match self.config.backend_url() {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping organization lookup: {}", e);
                return;
            }
        };
        let headers = match self.session.auth_headers().await {
            Ok(headers) => headers,
            Err(e) => {
                warn!("Skipping organization lookup: {}", e);
                return;
            }
        };

        let url = format!("{}/organizations/me/current", backend_url);
        debug!("Resolving organization via {}", url);

        let request = self.http.get(&url).headers(headers);
        let Some(resp) = upstream::dispatch("Organization lookup", request, &[StatusCode::OK]).await
        else {
            return;
        };

        match upstream::decode::<CurrentOrganization>("Organization lookup", resp).await {
            Some(org) if !org.org_id.is_empty() => {
                info!("Got org_id: {}", org.org_id);
                self.session.set_org_id(org.org_id).await;
            }
            _ => warn!("Organization lookup returned no org_id"),
        }
    }
}
