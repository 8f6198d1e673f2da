//! Core of the kb-bridge backend-for-frontend.
//!
//! Every operation is a thin translation onto the upstream indexing platform:
//! - `SessionStore`: the single process-wide access token and organization id
//! - `CredentialBroker`: password login followed by organization lookup
//! - `ResourceLister`: children of a cloud-storage node through the configured connection
//! - `KnowledgeBaseManager`: create, sync, list and de-index knowledge base entries
//!
//! Hard failures (missing configuration, no session) come back as `BridgeError`.
//! A rejected or unreachable upstream call is a soft failure: it is logged and
//! surfaces as `None` or `false`.

mod auth;
mod bridge;
mod config;
mod connections;
mod envelope;
mod error;
mod knowledge_base;
mod resource;
mod session;
mod upstream;

pub use auth::CredentialBroker;
pub use bridge::Bridge;
pub use config::UpstreamConfig;
pub use connections::ResourceLister;
pub use envelope::normalize_records;
pub use error::{BridgeError, Result};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseManager, DEFAULT_RESOURCE_PATH};
pub use resource::{ConnectionInfo, ResourceEntry, ResourceType};
pub use session::{Session, SessionStore};
