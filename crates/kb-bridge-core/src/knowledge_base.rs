//! Knowledge base lifecycle on the indexing platform.
//!
//! A knowledge base is created over a set of connection resources, synced on
//! demand (fire-and-forget, no status), and its indexed entries can be listed
//! or de-indexed one path at a time.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::UpstreamConfig;
use crate::error::Result;
use crate::resource::{RawResource, ResourceEntry};
use crate::session::SessionStore;
use crate::upstream;

/// Path listed when the caller does not name one.
pub const DEFAULT_RESOURCE_PATH: &str = "/";

const EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const CHUNKER: &str = "sentence";
const CHUNK_SIZE: u32 = 1500;
const CHUNK_OVERLAP: u32 = 500;

/// Knowledge base creation body.
#[derive(Debug, Serialize)]
struct CreateKnowledgeBaseRequest<'a> {
    connection_id: &'a str,
    connection_source_ids: &'a [String],
    name: &'a str,
    description: &'a str,
    indexing_params: IndexingParams,
    org_level_role: Option<String>,
    cron_job_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct IndexingParams {
    ocr: bool,
    unstructured: bool,
    embedding_params: EmbeddingParams,
    chunker_params: ChunkerParams,
}

#[derive(Debug, Serialize)]
struct EmbeddingParams {
    embedding_model: &'static str,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChunkerParams {
    chunk_size: u32,
    chunk_overlap: u32,
    chunker: &'static str,
}

impl IndexingParams {
    /// Indexing settings applied to every knowledge base.
    fn fixed() -> Self {
        Self {
            ocr: false,
            unstructured: true,
            embedding_params: EmbeddingParams {
                embedding_model: EMBEDDING_MODEL,
                api_key: None,
            },
            chunker_params: ChunkerParams {
                chunk_size: CHUNK_SIZE,
                chunk_overlap: CHUNK_OVERLAP,
                chunker: CHUNKER,
            },
        }
    }
}

#[derive(Deserialize)]
struct CreatedKnowledgeBase {
    knowledge_base_id: String,
    name: String,
    created_at: String,
    is_empty: bool,
}

/// A freshly created knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub is_empty: bool,
}

impl From<CreatedKnowledgeBase> for KnowledgeBase {
    fn from(kb: CreatedKnowledgeBase) -> Self {
        Self {
            id: kb.knowledge_base_id,
            name: kb.name,
            created_at: kb.created_at,
            is_empty: kb.is_empty,
        }
    }
}

/// Creates, syncs and edits knowledge bases.
pub struct KnowledgeBaseManager {
    http: Client,
    config: Arc<UpstreamConfig>,
    session: Arc<SessionStore>,
}

impl KnowledgeBaseManager {
    pub fn new(http: Client, config: Arc<UpstreamConfig>, session: Arc<SessionStore>) -> Self {
        Self {
            http,
            config,
            session,
        }
    }

    /// Create a knowledge base over `resource_ids` of the configured connection.
    #[instrument(skip(self), level = "debug")]
    pub async fn create_knowledge_base(
        &self,
        name: &str,
        description: &str,
        resource_ids: &[String],
    ) -> Result<Option<KnowledgeBase>> {
        let backend_url = self.config.backend_url()?;
        let connection_id = self.config.connection_id()?;
        let headers = self.session.auth_headers().await?;

        let body = CreateKnowledgeBaseRequest {
            connection_id,
            connection_source_ids: resource_ids,
            name,
            description,
            indexing_params: IndexingParams::fixed(),
            org_level_role: None,
            cron_job_id: None,
        };

        let request = self
            .http
            .post(format!("{}/knowledge_bases", backend_url))
            .headers(headers)
            .json(&body);

        let Some(resp) = upstream::dispatch(
            "Create knowledge base",
            request,
            &[StatusCode::OK, StatusCode::CREATED],
        )
        .await
        else {
            return Ok(None);
        };

        let created = upstream::decode::<CreatedKnowledgeBase>("Create knowledge base", resp)
            .await
            .map(KnowledgeBase::from);

        if let Some(kb) = &created {
            info!(
                "Created knowledge base {} over {} resources",
                kb.id,
                resource_ids.len()
            );
        }
        Ok(created)
    }

    /// Trigger a sync of `kb_id`. Requires the organization resolved at login.
    #[instrument(skip(self), level = "debug")]
    pub async fn sync_knowledge_base(&self, kb_id: &str) -> Result<bool> {
        let backend_url = self.config.backend_url()?;
        let headers = self.session.auth_headers().await?;

        let Some(org_id) = self.session.org_id().await else {
            error!("No org_id available, cannot sync knowledge base {}", kb_id);
            return Ok(false);
        };

        let Some(url) = upstream::endpoint(
            "Sync knowledge base",
            backend_url,
            &["knowledge_bases", "sync", "trigger", kb_id, org_id.as_str()],
        )?
        else {
            return Ok(false);
        };
        debug!("Triggering sync: {}", url);

        let request = self.http.get(url).headers(headers);
        let triggered = upstream::dispatch("Sync knowledge base", request, &[StatusCode::OK])
            .await
            .is_some();

        if triggered {
            info!("Sync triggered for knowledge base {}", kb_id);
        }
        Ok(triggered)
    }

    /// List indexed entries of `kb_id` under `resource_path`.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_knowledge_base_resources(
        &self,
        kb_id: &str,
        resource_path: &str,
    ) -> Result<Option<Vec<ResourceEntry>>> {
        let backend_url = self.config.backend_url()?;
        let headers = self.session.auth_headers().await?;

        let Some(url) = upstream::endpoint(
            "List knowledge base resources",
            backend_url,
            &["knowledge_bases", kb_id, "resources", "children"],
        )?
        else {
            return Ok(None);
        };

        let request = self
            .http
            .get(url)
            .headers(headers)
            .query(&[("resource_path", resource_path)]);

        let Some(records) =
            upstream::fetch_records::<RawResource>("List knowledge base resources", request)
                .await
        else {
            return Ok(None);
        };

        let entries = records
            .into_iter()
            .map(RawResource::into_knowledge_base_entry)
            .collect::<Vec<_>>();

        debug!(
            "Listed {} resources of knowledge base {} under {}",
            entries.len(),
            kb_id,
            resource_path
        );
        Ok(Some(entries))
    }

    /// De-index the entry at `resource_path` from `kb_id`.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_resource_from_kb(&self, kb_id: &str, resource_path: &str) -> Result<bool> {
        let backend_url = self.config.backend_url()?;
        let headers = self.session.auth_headers().await?;

        let Some(url) = upstream::endpoint(
            "Delete resource",
            backend_url,
            &["knowledge_bases", kb_id, "resources"],
        )?
        else {
            return Ok(false);
        };

        let request = self
            .http
            .delete(url)
            .headers(headers)
            .query(&[("resource_path", resource_path)]);

        let deleted = upstream::dispatch(
            "Delete resource",
            request,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await
        .is_some();

        if deleted {
            info!("Removed {} from knowledge base {}", resource_path, kb_id);
        }
        Ok(deleted)
    }
}
