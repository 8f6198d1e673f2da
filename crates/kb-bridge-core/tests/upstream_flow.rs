use kb_bridge_core::{
    Bridge, BridgeError, ConnectionInfo, KnowledgeBase, ResourceType, UpstreamConfig,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{
    body_json, body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONNECTION_ID: &str = "conn-123";

fn config_for(server: &MockServer) -> UpstreamConfig {
    UpstreamConfig {
        identity_url: Some(server.uri()),
        api_key: Some("anon-key".to_string()),
        backend_url: Some(format!("{}/", server.uri())),
        connection_id: Some(CONNECTION_ID.to_string()),
        ..Default::default()
    }
}

fn bridge_for(server: &MockServer) -> Bridge {
    Bridge::new(config_for(server)).unwrap()
}

async fn mount_login(server: &MockServer, password: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("Apikey", "anon-key"))
        .and(body_partial_json(json!({"password": password})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": token, "token_type": "bearer"})),
        )
        .mount(server)
        .await;
}

async fn mount_rejected_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

async fn mount_org(server: &MockServer, token: &str, org_id: &str) {
    Mock::given(method("GET"))
        .and(path("/organizations/me/current"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"org_id": org_id})))
        .mount(server)
        .await;
}

/// Bridge with a live session (token `tok`, org `org-1`).
async fn logged_in(server: &MockServer) -> Bridge {
    mount_login(server, "secret", "tok").await;
    mount_org(server, "tok", "org-1").await;
    let bridge = bridge_for(server);
    bridge.auth.login("user@example.com", "secret").await.unwrap();
    bridge
}

fn resource_records() -> serde_json::Value {
    json!([
        {
            "resource_id": "f1",
            "inode_path": {"path": "reports"},
            "inode_type": "directory"
        },
        {
            "resource_id": "f2",
            "inode_path": {"path": "reports/q1.pdf"},
            "inode_type": "file",
            "size": 4096,
            "content_mime": "application/pdf",
            "indexed_at": "2024-05-01T10:00:00Z",
            "status": "indexed"
        }
    ])
}

#[tokio::test]
async fn test_login_stores_token_and_org() {
    let server = MockServer::start().await;
    mount_login(&server, "secret", "tok").await;
    mount_org(&server, "tok", "org-1").await;
    let bridge = bridge_for(&server);

    let token = bridge.auth.login("user@example.com", "secret").await.unwrap();

    assert_eq!(token.as_deref(), Some("tok"));
    assert!(bridge.session.is_authenticated().await);
    assert_eq!(bridge.session.org_id().await.as_deref(), Some("org-1"));
}

#[tokio::test]
async fn test_login_sends_password_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(body_json(json!({
            "email": "user@example.com",
            "password": "secret",
            "gotrue_meta_security": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .expect(1)
        .mount(&server)
        .await;
    let bridge = bridge_for(&server);

    let token = bridge.auth.login("user@example.com", "secret").await.unwrap();

    assert_eq!(token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_rejected_login_keeps_previous_session() {
    let server = MockServer::start().await;
    mount_rejected_login(&server).await;
    let bridge = logged_in(&server).await;
    let before = bridge.session.snapshot().await;

    let token = bridge.auth.login("user@example.com", "wrong").await.unwrap();

    assert_eq!(token, None);
    assert_eq!(bridge.session.snapshot().await, before);
    assert!(bridge.session.is_authenticated().await);
}

#[tokio::test]
async fn test_rejected_login_without_session_stays_unauthenticated() {
    let server = MockServer::start().await;
    mount_rejected_login(&server).await;
    let bridge = bridge_for(&server);

    assert_eq!(bridge.auth.login("user@example.com", "wrong").await.unwrap(), None);
    assert!(matches!(
        bridge.session.auth_headers().await,
        Err(BridgeError::AuthenticationRequired)
    ));
}

#[tokio::test]
async fn test_failed_org_lookup_is_not_fatal() {
    let server = MockServer::start().await;
    mount_login(&server, "secret", "tok").await;
    Mock::given(method("GET"))
        .and(path("/organizations/me/current"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let bridge = bridge_for(&server);

    let token = bridge.auth.login("user@example.com", "secret").await.unwrap();

    assert_eq!(token.as_deref(), Some("tok"));
    assert_eq!(bridge.session.org_id().await, None);
}

#[tokio::test]
async fn test_login_requires_identity_configuration() {
    let server = MockServer::start().await;
    let bridge = Bridge::new(UpstreamConfig {
        identity_url: None,
        ..config_for(&server)
    })
    .unwrap();

    assert!(matches!(
        bridge.auth.login("user@example.com", "secret").await,
        Err(BridgeError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_listing_requires_session() {
    let server = MockServer::start().await;
    let bridge = bridge_for(&server);

    assert!(matches!(
        bridge.connections.list_resources(None).await,
        Err(BridgeError::AuthenticationRequired)
    ));
    assert!(matches!(
        bridge.knowledge_bases.sync_knowledge_base("kb1").await,
        Err(BridgeError::AuthenticationRequired)
    ));
}

#[tokio::test]
async fn test_listing_requires_connection_id() {
    let server = MockServer::start().await;
    let bridge = Bridge::new(UpstreamConfig {
        connection_id: None,
        ..config_for(&server)
    })
    .unwrap();

    assert!(matches!(
        bridge.connections.list_resources(None).await,
        Err(BridgeError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_list_resources_envelope_shapes_match() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    let children = format!("/connections/{}/resources/children", CONNECTION_ID);

    Mock::given(method("GET"))
        .and(path(children.as_str()))
        .and(query_param_is_missing("resource_id"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": resource_records()})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(children.as_str()))
        .and(query_param("resource_id", "folder-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource_records()))
        .mount(&server)
        .await;

    let wrapped = bridge.connections.list_resources(None).await.unwrap().unwrap();
    let bare = bridge
        .connections
        .list_resources(Some("folder-9"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(wrapped, bare);
    assert_eq!(wrapped.len(), 2);

    let folder = &wrapped[0];
    assert_eq!(folder.id, "f1");
    assert_eq!(folder.name, "reports");
    assert_eq!(folder.resource_type, ResourceType::Directory);
    assert_eq!(folder.size, Some(0));
    assert_eq!(folder.mime_type.as_deref(), Some(""));
    assert_eq!(folder.indexed_at, None);
    assert_eq!(folder.status, "resource");

    let file = &wrapped[1];
    assert_eq!(file.resource_type, ResourceType::File);
    assert_eq!(file.size, Some(4096));
    assert_eq!(file.status, "indexed");
}

#[tokio::test]
async fn test_list_resources_failure_is_not_empty_list() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/connections/{}/resources/children", CONNECTION_ID).as_str()))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    assert_eq!(bridge.connections.list_resources(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_connection_info_matches_configured_id() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/connections"))
        .and(query_param("connection_provider", "gdrive"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"connection_id": "other", "name": "Other drive", "created_at": "2024-01-01"},
            {"connection_id": CONNECTION_ID, "name": "Team drive", "created_at": "2024-02-01"}
        ])))
        .mount(&server)
        .await;

    let info = bridge.connections.connection_info().await.unwrap();

    assert_eq!(
        info,
        Some(ConnectionInfo {
            id: CONNECTION_ID.to_string(),
            name: "Team drive".to_string(),
            created_at: "2024-02-01".to_string(),
        })
    );
}

#[tokio::test]
async fn test_connection_info_without_match() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"connection_id": "other", "name": "Other drive", "created_at": "2024-01-01"}
        ])))
        .mount(&server)
        .await;

    assert_eq!(bridge.connections.connection_info().await.unwrap(), None);
}

#[tokio::test]
async fn test_create_knowledge_base_end_to_end() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/knowledge_bases"))
        .and(header("Authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "connection_id": CONNECTION_ID,
            "connection_source_ids": ["r1"],
            "name": "Test",
            "indexing_params": {"chunker_params": {"chunk_size": 1500}}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "knowledge_base_id": "kb1",
            "name": "Test",
            "created_at": "t",
            "is_empty": true,
            "connection_id": CONNECTION_ID
        })))
        .expect(1)
        .mount(&server)
        .await;

    let kb = bridge
        .knowledge_bases
        .create_knowledge_base("Test", "", &["r1".to_string()])
        .await
        .unwrap();

    assert_eq!(
        kb,
        Some(KnowledgeBase {
            id: "kb1".to_string(),
            name: "Test".to_string(),
            created_at: "t".to_string(),
            is_empty: true,
        })
    );
}

#[tokio::test]
async fn test_create_knowledge_base_rejected() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/knowledge_bases"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "bad ids"})))
        .mount(&server)
        .await;

    let kb = bridge
        .knowledge_bases
        .create_knowledge_base("Test", "desc", &["r1".to_string()])
        .await
        .unwrap();

    assert_eq!(kb, None);
}

#[tokio::test]
async fn test_sync_without_org_makes_no_call() {
    let server = MockServer::start().await;
    mount_login(&server, "secret", "tok").await;
    Mock::given(method("GET"))
        .and(path("/organizations/me/current"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/knowledge_bases/sync/trigger/kb1/org-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let bridge = bridge_for(&server);
    bridge.auth.login("user@example.com", "secret").await.unwrap();

    assert!(!bridge.knowledge_bases.sync_knowledge_base("kb1").await.unwrap());
}

#[tokio::test]
async fn test_sync_uses_org_scoped_trigger() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/knowledge_bases/sync/trigger/kb1/org-1"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    assert!(bridge.knowledge_bases.sync_knowledge_base("kb1").await.unwrap());
    assert!(bridge.knowledge_bases.sync_knowledge_base("kb1").await.unwrap());
}

#[tokio::test]
async fn test_list_knowledge_base_resources_mixed_paths() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/knowledge_bases/kb1/resources/children"))
        .and(query_param("resource_path", "/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"resource_id": "a", "inode_path": "docs", "inode_type": "directory"},
            {
                "resource_id": "b",
                "inode_path": {"path": "docs/guide.md"},
                "inode_type": "file",
                "status": "indexed",
                "indexed_at": "2024-06-01"
            },
            {"resource_id": "c", "inode_type": "file"}
        ]})))
        .mount(&server)
        .await;

    let entries = bridge
        .knowledge_bases
        .list_knowledge_base_resources("kb1", "/")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "docs");
    assert_eq!(entries[0].status, "unknown");
    assert_eq!(entries[1].name, "docs/guide.md");
    assert_eq!(entries[1].status, "indexed");
    assert_eq!(entries[1].indexed_at.as_deref(), Some("2024-06-01"));
    assert_eq!(entries[1].size, None);
}

#[tokio::test]
async fn test_delete_resource_status_handling() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/knowledge_bases/kb1/resources"))
        .and(query_param("resource_path", "docs/guide.md"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/knowledge_bases/kb1/resources"))
        .and(query_param("resource_path", "missing.md"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    assert!(bridge
        .knowledge_bases
        .delete_resource_from_kb("kb1", "docs/guide.md")
        .await
        .unwrap());
    assert!(!bridge
        .knowledge_bases
        .delete_resource_from_kb("kb1", "missing.md")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_kb_id_stays_one_path_segment() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/knowledge_bases/kb1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/knowledge_bases/kb1%3F/resources"))
        .and(query_param("resource_path", "x"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/knowledge_bases/..%2Fconnections/resources/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(bridge
        .knowledge_bases
        .delete_resource_from_kb("kb1?", "x")
        .await
        .unwrap());
    assert_eq!(
        bridge
            .knowledge_bases
            .list_knowledge_base_resources("../connections", "/")
            .await
            .unwrap(),
        Some(vec![])
    );
}

#[tokio::test]
async fn test_dot_segment_kb_id_makes_no_call() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/knowledge_bases/sync/trigger/org-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!bridge
        .knowledge_bases
        .delete_resource_from_kb("..", "x")
        .await
        .unwrap());
    assert!(!bridge.knowledge_bases.sync_knowledge_base("..").await.unwrap());
}

#[tokio::test]
async fn test_login_body_without_token_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(body_partial_json(json!({"password": "other"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "bearer"})))
        .mount(&server)
        .await;
    let bridge = logged_in(&server).await;
    let before = bridge.session.snapshot().await;

    let token = bridge.auth.login("user@example.com", "other").await.unwrap();

    assert_eq!(token, None);
    assert_eq!(bridge.session.snapshot().await, before);
}

#[tokio::test]
async fn test_login_without_backend_url_leaves_org_unset() {
    let server = MockServer::start().await;
    mount_login(&server, "secret", "tok").await;
    Mock::given(method("GET"))
        .and(path("/organizations/me/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"org_id": "org-1"})))
        .expect(0)
        .mount(&server)
        .await;
    let bridge = Bridge::new(UpstreamConfig {
        backend_url: None,
        ..config_for(&server)
    })
    .unwrap();

    let token = bridge.auth.login("user@example.com", "secret").await.unwrap();

    assert_eq!(token.as_deref(), Some("tok"));
    assert!(bridge.session.is_authenticated().await);
    assert_eq!(bridge.session.org_id().await, None);
}

#[tokio::test]
async fn test_create_knowledge_base_accepts_ok() {
    let server = MockServer::start().await;
    let bridge = logged_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/knowledge_bases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "knowledge_base_id": "kb2",
            "name": "Docs",
            "created_at": "2024-07-01",
            "is_empty": false
        })))
        .mount(&server)
        .await;

    let kb = bridge
        .knowledge_bases
        .create_knowledge_base("Docs", "", &["r1".to_string()])
        .await
        .unwrap();

    assert_eq!(
        kb,
        Some(KnowledgeBase {
            id: "kb2".to_string(),
            name: "Docs".to_string(),
            created_at: "2024-07-01".to_string(),
            is_empty: false,
        })
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_soft_failure() {
    // Nothing listens on a port once its listener is dropped
    let base = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let bridge = Bridge::new(UpstreamConfig {
        identity_url: Some(base.clone()),
        api_key: Some("anon-key".to_string()),
        backend_url: Some(base),
        connection_id: Some(CONNECTION_ID.to_string()),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(
        bridge.auth.login("user@example.com", "secret").await.unwrap(),
        None
    );

    bridge
        .session
        .set_session("tok".to_string(), Some("org-1".to_string()))
        .await;

    assert_eq!(bridge.connections.list_resources(None).await.unwrap(), None);
    assert_eq!(bridge.connections.connection_info().await.unwrap(), None);
    assert!(!bridge.knowledge_bases.sync_knowledge_base("kb1").await.unwrap());
    assert_eq!(
        bridge
            .knowledge_bases
            .create_knowledge_base("Test", "", &["r1".to_string()])
            .await
            .unwrap(),
        None
    );
}
