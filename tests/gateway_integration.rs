//! Wire-level tests for the CREST gateway against a local mock AM server
//!
//! Covers the request layout of every operation, the single re-authentication
//! retry on 401 and the agent session login.

use am_crest::api::{
    AgentSession, AgentSessionProvider, CrestClient, CrestError, ErrorKind, OperationInput,
    OperationKind, ServerInfo, Session, SessionProvider, StaticSessionProvider,
};
use async_trait::async_trait;
use mockito::{Matcher, Server};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

const COOKIE: &str = "iPlanetDirectoryPro";

/// Hands out a stale token until invalidated, then a fresh one
#[derive(Default)]
struct RotatingSessions {
    invalidations: AtomicU32,
}

#[async_trait]
impl SessionProvider for RotatingSessions {
    async fn server_info(&self) -> Result<ServerInfo, CrestError> {
        Ok(ServerInfo {
            cookie_name: COOKIE.to_string(),
        })
    }

    async fn agent_session(&self) -> Result<AgentSession, CrestError> {
        let token_id = if self.invalidations.load(Ordering::SeqCst) == 0 {
            "stale-token"
        } else {
            "fresh-token"
        };
        Ok(AgentSession {
            token_id: token_id.to_string(),
        })
    }

    async fn invalidate(&self, rejected: &Session) {
        assert_eq!(rejected.cookie_name, COOKIE);
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

fn static_client(base_url: &str, default_realm: Option<&str>) -> CrestClient {
    CrestClient::with_custom_client(
        base_url,
        reqwest::Client::new(),
        Arc::new(StaticSessionProvider::new(COOKIE, "AQIC-token")),
        default_realm.map(str::to_string),
    )
}

fn realm(value: &str) -> Matcher {
    Matcher::UrlEncoded("realm".into(), value.into())
}

#[tokio::test]
async fn test_create_without_id_posts_action_create() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/json/users")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("_action".into(), "create".into()),
            realm("/"),
        ]))
        .match_header("Accept-API-Version", "protocol=2.0,resource=1.0")
        .match_header("Content-Type", "application/json")
        .match_header(COOKIE, "AQIC-token")
        .match_body(Matcher::Json(json!({"username": "demo", "mail": "demo@example.com"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"_id": "a1b2", "username": "demo"}"#)
        .create_async()
        .await;

    let created = static_client(&server.url(), None)
        .create_resource(
            "users",
            None,
            json!({"username": "demo", "mail": "demo@example.com"}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(created["_id"], "a1b2");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_with_id_puts_if_none_match() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/json/users/demo")
        .match_query(realm("/alpha"))
        .match_header("If-None-Match", "*")
        .match_body(Matcher::Json(json!({"username": "demo"})))
        .with_status(201)
        .with_body(r#"{"_id": "demo"}"#)
        .create_async()
        .await;

    let created = static_client(&server.url(), Some("/alpha"))
        .create_resource("/users", Some("demo"), json!({"username": "demo"}), None)
        .await
        .unwrap();

    assert_eq!(created, json!({"_id": "demo"}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_strips_id_and_puts_if_match() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/json/users/demo")
        .match_query(realm("/"))
        .match_header("If-Match", "*")
        .match_body(Matcher::Json(json!({"mail": "new@example.com"})))
        .with_status(200)
        .with_body(r#"{"_id": "demo", "mail": "new@example.com"}"#)
        .create_async()
        .await;

    let input = OperationInput::new("users")
        .with_id("demo")
        .with_payload(json!({"_id": "demo", "mail": "new@example.com"}));
    let updated = static_client(&server.url(), None)
        .execute(OperationKind::Update, &input)
        .await
        .unwrap();

    assert_eq!(updated["mail"], "new@example.com");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_explicit_realm_overrides_default() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/json/realms/root/users/demo")
        .match_query(realm("/beta"))
        .with_status(200)
        .with_body(r#"{"_id": "demo"}"#)
        .create_async()
        .await;

    static_client(&server.url(), Some("/alpha"))
        .read_resource("realms/root/users/demo", Some("/beta"))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_and_empty_response_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/json/users/demo")
        .match_query(realm("/"))
        .match_header("If-Match", "*")
        .with_status(204)
        .create_async()
        .await;

    let result = static_client(&server.url(), None)
        .delete_resource("users/demo", None)
        .await
        .unwrap();

    assert_eq!(result, Value::Null);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_patch_sends_operations() {
    let mut server = Server::new_async().await;
    let operations = json!([{"operation": "replace", "field": "/mail", "value": "p@example.com"}]);
    let mock = server
        .mock("PATCH", "/json/users/demo")
        .match_query(realm("/"))
        .match_header("If-Match", "*")
        .match_body(Matcher::Json(operations.clone()))
        .with_status(200)
        .with_body(r#"{"_id": "demo", "mail": "p@example.com"}"#)
        .create_async()
        .await;

    let patched = static_client(&server.url(), None)
        .patch_resource("users/demo", operations, None)
        .await
        .unwrap();

    assert_eq!(patched["mail"], "p@example.com");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_action_posts_named_action() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/json/sessions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("_action".into(), "validate".into()),
            realm("/"),
        ]))
        .match_body(Matcher::Json(json!({"tokenId": "AQIC-other"})))
        .with_status(200)
        .with_body(r#"{"valid": true}"#)
        .create_async()
        .await;

    let result = static_client(&server.url(), None)
        .action_resource("sessions", "validate", json!({"tokenId": "AQIC-other"}), None)
        .await
        .unwrap();

    assert_eq!(result, json!({"valid": true}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_renders_payload_as_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/json/users")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("_queryFilter".into(), "uid sw \"de\"".into()),
            Matcher::UrlEncoded("_pageSize".into(), "5".into()),
            Matcher::UrlEncoded("_fields".into(), "uid,mail".into()),
            realm("/alpha"),
        ]))
        .with_status(200)
        .with_body(r#"{"result": [{"uid": "demo"}], "resultCount": 1}"#)
        .create_async()
        .await;

    let result = static_client(&server.url(), Some("/alpha"))
        .query_resource(
            "users",
            json!({"_queryFilter": "uid sw \"de\"", "_pageSize": 5, "_fields": ["uid", "mail"]}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(result["resultCount"], 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_expired_session_is_refreshed_once() {
    let mut server = Server::new_async().await;
    let stale = server
        .mock("GET", "/json/users/demo")
        .match_query(Matcher::Any)
        .match_header(COOKIE, "stale-token")
        .with_status(401)
        .with_body(r#"{"code": 401, "reason": "Unauthorized"}"#)
        .expect(1)
        .create_async()
        .await;
    let fresh = server
        .mock("GET", "/json/users/demo")
        .match_query(Matcher::Any)
        .match_header(COOKIE, "fresh-token")
        .with_status(200)
        .with_body(r#"{"_id": "demo"}"#)
        .expect(1)
        .create_async()
        .await;

    let sessions = Arc::new(RotatingSessions::default());
    let client = CrestClient::with_custom_client(&server.url(), reqwest::Client::new(), sessions.clone(), None);

    let result = client.read_resource("users/demo", None).await.unwrap();

    assert_eq!(result["_id"], "demo");
    assert_eq!(sessions.invalidations.load(Ordering::SeqCst), 1);
    stale.assert_async().await;
    fresh.assert_async().await;
}

#[tokio::test]
async fn test_persistent_401_stops_after_second_attempt() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/json/users/demo")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"code": 401, "reason": "Unauthorized"}"#)
        .expect(2)
        .create_async()
        .await;

    let sessions = Arc::new(RotatingSessions::default());
    let client = CrestClient::with_custom_client(&server.url(), reqwest::Client::new(), sessions.clone(), None);

    let err = client.read_resource("users/demo", None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthExpired);
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.body().unwrap()["reason"], "Unauthorized");
    assert_eq!(sessions.invalidations.load(Ordering::SeqCst), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/json/users/ghost")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"code": 404, "reason": "Not Found", "message": "Resource 'ghost' not found"}"#)
        .expect(1)
        .create_async()
        .await;

    let sessions = Arc::new(RotatingSessions::default());
    let client = CrestClient::with_custom_client(&server.url(), reqwest::Client::new(), sessions.clone(), None);

    let err = client.read_resource("users/ghost", None).await.unwrap_err();

    match err {
        CrestError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body["reason"], "Not Found");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(sessions.invalidations.load(Ordering::SeqCst), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_validation_error_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = static_client(&server.url(), None)
        .query_resource("users", json!({"_queryFilter": 42}), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ids_with_url_syntax_send_nothing() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for method in ["GET", "PUT", "POST", "PATCH", "DELETE"] {
        mocks.push(server.mock(method, Matcher::Any).expect(0).create_async().await);
    }
    let client = static_client(&server.url(), None);

    let err = client
        .execute(OperationKind::Delete, &OperationInput::new("users").with_id("alice#bob"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = client
        .create_resource("users", Some("alice?x=1"), json!({"mail": "a@example.com"}), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = client
        .execute(OperationKind::Update, &OperationInput::new("users").with_id("..").with_payload(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = client.read_resource("users/../realms", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_agent_session_login_is_shared() {
    let mut server = Server::new_async().await;
    let server_info = server
        .mock("GET", "/json/serverinfo/*")
        .with_status(200)
        .with_body(r#"{"cookieName": "amCookie", "domains": []}"#)
        .expect(1)
        .create_async()
        .await;
    let login = server
        .mock("POST", "/json/authenticate")
        .match_query(realm("/alpha"))
        .match_header("X-OpenAM-Username", "agent")
        .match_header("X-OpenAM-Password", "changeit")
        .with_status(200)
        .with_body(r#"{"tokenId": "AQIC-agent", "successUrl": "/openam/console"}"#)
        .expect(1)
        .create_async()
        .await;
    let read = server
        .mock("GET", "/json/users/demo")
        .match_query(realm("/alpha"))
        .match_header("amCookie", "AQIC-agent")
        .with_status(200)
        .with_body(r#"{"_id": "demo"}"#)
        .expect(2)
        .create_async()
        .await;

    let sessions = Arc::new(AgentSessionProvider::new(
        server.url(),
        Some("/alpha"),
        "agent",
        "changeit",
        reqwest::Client::new(),
    ));
    let client = CrestClient::with_custom_client(
        &server.url(),
        reqwest::Client::new(),
        sessions,
        Some("/alpha".to_string()),
    );

    let (first, second) = tokio::join!(
        client.read_resource("users/demo", None),
        client.read_resource("users/demo", None),
    );
    assert_eq!(first.unwrap()["_id"], "demo");
    assert_eq!(second.unwrap()["_id"], "demo");

    server_info.assert_async().await;
    login.assert_async().await;
    read.assert_async().await;
}

#[tokio::test]
async fn test_failed_agent_login_is_session_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/json/serverinfo/*")
        .with_status(200)
        .with_body(r#"{"cookieName": "iPlanetDirectoryPro"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/json/authenticate")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"code": 401, "reason": "Unauthorized", "message": "Authentication Failed"}"#)
        .create_async()
        .await;

    let sessions = AgentSessionProvider::new(server.url(), None, "agent", "wrong", reqwest::Client::new());

    let err = sessions.session().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Session);
}
