//! Value types built from upstream records.

use serde::{Deserialize, Serialize};

/// Status reported for connection children that carry none.
const CONNECTION_DEFAULT_STATUS: &str = "resource";
/// Status reported for knowledge base entries that carry none.
const KNOWLEDGE_BASE_DEFAULT_STATUS: &str = "unknown";

/// Kind of node in a connection or knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Directory,
}

/// A file or folder, flattened for the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    pub id: String,
    /// Full path of the node
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub indexed_at: Option<String>,
    pub status: String,
}

/// The connection the bridge browses through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Node path: nested `{"path": ...}` on most endpoints, a bare string on
/// older knowledge base listings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InodePath {
    Nested { path: String },
    Plain(String),
}

impl InodePath {
    fn into_path(self) -> String {
        match self {
            InodePath::Nested { path } | InodePath::Plain(path) => path,
        }
    }
}

/// Resource record as the platform returns it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawResource {
    resource_id: String,
    inode_path: InodePath,
    inode_type: ResourceType,
    size: Option<u64>,
    content_mime: Option<String>,
    indexed_at: Option<String>,
    status: Option<String>,
}

impl RawResource {
    /// Child of a connection node: size and MIME type are always reported.
    pub(crate) fn into_connection_entry(self) -> ResourceEntry {
        ResourceEntry {
            id: self.resource_id,
            name: self.inode_path.into_path(),
            resource_type: self.inode_type,
            size: Some(self.size.unwrap_or(0)),
            mime_type: Some(self.content_mime.unwrap_or_default()),
            indexed_at: self.indexed_at,
            status: self
                .status
                .unwrap_or_else(|| CONNECTION_DEFAULT_STATUS.to_string()),
        }
    }

    /// Entry of a knowledge base: only identity, path, type and indexing state.
    pub(crate) fn into_knowledge_base_entry(self) -> ResourceEntry {
        ResourceEntry {
            id: self.resource_id,
            name: self.inode_path.into_path(),
            resource_type: self.inode_type,
            size: None,
            mime_type: None,
            indexed_at: self.indexed_at,
            status: self
                .status
                .unwrap_or_else(|| KNOWLEDGE_BASE_DEFAULT_STATUS.to_string()),
        }
    }
}

/// Connection record as the platform returns it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawConnection {
    pub connection_id: String,
    pub name: String,
    pub created_at: String,
}

impl From<RawConnection> for ConnectionInfo {
    fn from(raw: RawConnection) -> Self {
        Self {
            id: raw.connection_id,
            name: raw.name,
            created_at: raw.created_at,
        }
    }
}
