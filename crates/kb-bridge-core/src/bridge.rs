//! One-stop construction of the session and the components sharing it.

use std::sync::Arc;

use crate::auth::CredentialBroker;
use crate::config::UpstreamConfig;
use crate::connections::ResourceLister;
use crate::error::Result;
use crate::knowledge_base::KnowledgeBaseManager;
use crate::session::SessionStore;

/// The session plus every component reading it, over one HTTP client.
pub struct Bridge {
    pub session: Arc<SessionStore>,
    pub auth: CredentialBroker,
    pub connections: ResourceLister,
    pub knowledge_bases: KnowledgeBaseManager,
}

impl Bridge {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = config.http_client()?;
        let config = Arc::new(config);
        let session = Arc::new(SessionStore::new());

        Ok(Self {
            auth: CredentialBroker::new(http.clone(), config.clone(), session.clone()),
            connections: ResourceLister::new(http.clone(), config.clone(), session.clone()),
            knowledge_bases: KnowledgeBaseManager::new(http, config, session.clone()),
            session,
        })
    }
}
