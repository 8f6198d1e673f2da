//! Browsing the connected cloud-storage source.

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::UpstreamConfig;
use crate::error::Result;
use crate::resource::{ConnectionInfo, RawConnection, RawResource, ResourceEntry};
use crate::session::SessionStore;
use crate::upstream;

/// Provider filter for the connection lookup.
const CONNECTION_PROVIDER: &str = "gdrive";
/// Page size for the connection lookup; the configured connection is
/// expected within it.
const CONNECTION_PAGE_LIMIT: &str = "5";

/// Lists files and folders through the configured connection.
pub struct ResourceLister {
    http: Client,
    config: Arc<UpstreamConfig>,
    session: Arc<SessionStore>,
}

impl ResourceLister {
    pub fn new(http: Client, config: Arc<UpstreamConfig>, session: Arc<SessionStore>) -> Self {
        Self {
            http,
            config,
            session,
        }
    }

    /// List the children of `resource_id`, or of the connection root when
    /// `None`.
    ///
    /// `Ok(None)` means the upstream call failed, as opposed to an empty
    /// folder.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_resources(
        &self,
        resource_id: Option<&str>,
    ) -> Result<Option<Vec<ResourceEntry>>> {
        let backend_url = self.config.backend_url()?;
        let connection_id = self.config.connection_id()?;
        let headers = self.session.auth_headers().await?;

        let Some(url) = upstream::endpoint(
            "Fetch resources",
            backend_url,
            &["connections", connection_id, "resources", "children"],
        )?
        else {
            return Ok(None);
        };
        debug!("Fetching resources: {} (resource_id={:?})", url, resource_id);

        let mut request = self.http.get(url).headers(headers);
        if let Some(resource_id) = resource_id.filter(|id| !id.is_empty()) {
            request = request.query(&[("resource_id", resource_id)]);
        }

        let Some(records) =
            upstream::fetch_records::<RawResource>("Fetch resources", request).await
        else {
            return Ok(None);
        };

        let entries = records
            .into_iter()
            .map(RawResource::into_connection_entry)
            .collect::<Vec<_>>();

        debug!("Listed {} resources", entries.len());
        Ok(Some(entries))
    }

    /// Details of the configured connection, `None` if the provider listing
    /// does not contain it.
    #[instrument(skip(self), level = "debug")]
    pub async fn connection_info(&self) -> Result<Option<ConnectionInfo>> {
        let backend_url = self.config.backend_url()?;
        let connection_id = self.config.connection_id()?;
        let headers = self.session.auth_headers().await?;

        let request = self
            .http
            .get(format!("{}/connections", backend_url))
            .headers(headers)
            .query(&[
                ("connection_provider", CONNECTION_PROVIDER),
                ("limit", CONNECTION_PAGE_LIMIT),
            ]);

        let Some(connections) =
            upstream::fetch_records::<RawConnection>("Fetch connections", request).await
        else {
            return Ok(None);
        };

        let found = connections
            .into_iter()
            .find(|c| c.connection_id == connection_id)
            .map(ConnectionInfo::from);

        if found.is_none() {
            debug!("Connection {} not in provider listing", connection_id);
        }
        Ok(found)
    }
}
