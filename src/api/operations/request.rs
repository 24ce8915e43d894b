//! Translation of operations into CREST HTTP request descriptors
//!
//! Building a request performs no I/O. All input validation happens here, so a
//! malformed call fails before the session provider or the network is touched.

use reqwest::Method;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::operation::{OperationInput, OperationKind};
use crate::api::constants::{self, headers, params};
use crate::api::error::CrestError;

/// Fully specified HTTP exchange, relative to the server base URL
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Absolute path including the `/json` prefix
    pub path: String,
    pub query_params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    fn new(method: Method, resource_path: &str, realm: String) -> Self {
        let mut query_params = BTreeMap::new();
        query_params.insert(params::REALM.to_string(), realm);

        let mut request_headers = BTreeMap::new();
        request_headers.insert(
            headers::ACCEPT_API_VERSION.to_string(),
            headers::CREST_API_VERSION.to_string(),
        );
        request_headers.insert(
            headers::CONTENT_TYPE.to_string(),
            headers::CONTENT_TYPE_JSON.to_string(),
        );

        Self {
            method,
            path: format!("{}{}", constants::CREST_BASE_PATH, resource_path),
            query_params,
            headers: request_headers,
            body: None,
        }
    }

    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.insert(name.to_string(), value.into());
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|v| v.as_str())
    }
}

/// Builds request descriptors, resolving realms against a configured default
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    default_realm: Option<String>,
}

impl RequestBuilder {
    pub fn new(default_realm: Option<String>) -> Self {
        Self { default_realm }
    }

    pub fn default_realm(&self) -> Option<&str> {
        self.default_realm.as_deref()
    }

    pub fn build(&self, kind: OperationKind, input: &OperationInput) -> Result<RequestDescriptor, CrestError> {
        let path = normalize_path(&input.resource_path)
            .map_err(|e| invalid(kind, e))?;
        let realm = constants::resolve_realm(input.realm.as_deref(), self.default_realm());

        match kind {
            OperationKind::Create => {
                let payload = require_object(kind, input.payload.as_ref())?;
                match input.effective_id() {
                    Some(id) => {
                        let path = join_id(&path, id).map_err(|e| invalid(kind, e))?;
                        Ok(RequestDescriptor::new(Method::PUT, &path, realm)
                            .with_header(headers::IF_NONE_MATCH, headers::ANY_REVISION)
                            .with_body(Value::Object(payload.clone())))
                    }
                    None => Ok(RequestDescriptor::new(Method::POST, &path, realm)
                        .with_query(params::ACTION, params::ACTION_CREATE)
                        .with_body(Value::Object(payload.clone()))),
                }
            }
            OperationKind::Read => {
                let path = target_path(kind, &path, input)?;
                Ok(RequestDescriptor::new(Method::GET, &path, realm))
            }
            OperationKind::Update => {
                let payload = require_object(kind, input.payload.as_ref())?;
                let path = target_path(kind, &path, input)?;
                Ok(RequestDescriptor::new(Method::PUT, &path, realm)
                    .with_header(headers::IF_MATCH, headers::ANY_REVISION)
                    .with_body(strip_id(payload)))
            }
            OperationKind::Patch => {
                let body = match input.payload.as_ref() {
                    Some(Value::Object(map)) => strip_id(map),
                    // Already a list of CREST patch operations
                    Some(ops @ Value::Array(_)) => ops.clone(),
                    _ => return Err(invalid(kind, "payload must be a JSON object or an array of patch operations")),
                };
                let path = target_path(kind, &path, input)?;
                Ok(RequestDescriptor::new(Method::PATCH, &path, realm)
                    .with_header(headers::IF_MATCH, headers::ANY_REVISION)
                    .with_body(body))
            }
            OperationKind::Delete => {
                let path = target_path(kind, &path, input)?;
                Ok(RequestDescriptor::new(Method::DELETE, &path, realm)
                    .with_header(headers::IF_MATCH, headers::ANY_REVISION))
            }
            OperationKind::Action => {
                let action = input
                    .action
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .ok_or_else(|| invalid(kind, "action name is required"))?;
                let payload = require_object(kind, input.payload.as_ref())?;
                Ok(RequestDescriptor::new(Method::POST, &path, realm)
                    .with_query(params::ACTION, action)
                    .with_body(Value::Object(payload.clone())))
            }
            OperationKind::Query => {
                let payload = require_object(kind, input.payload.as_ref())?;
                let has_criteria = [params::QUERY_FILTER, params::QUERY_ID]
                    .iter()
                    .any(|key| payload.get(*key).is_some_and(Value::is_string));
                if !has_criteria {
                    return Err(invalid(kind, "payload must contain _queryFilter or _queryId"));
                }

                let mut request = RequestDescriptor::new(Method::GET, &path, realm.clone());
                for (key, value) in payload {
                    if let Some(rendered) = query_value(value) {
                        request = request.with_query(key, rendered);
                    }
                }
                // The resolved realm wins over a realm key in the payload
                Ok(request.with_query(params::REALM, realm))
            }
        }
    }
}

fn invalid(kind: OperationKind, message: impl std::fmt::Display) -> CrestError {
    CrestError::validation(format!("invalid {} parameters: {}", kind, message))
}

/// Characters the URL parser would treat as a query, a fragment, an escape or
/// a path separator
const URL_SPECIAL: [char; 4] = ['?', '#', '%', '\\'];

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

/// Ensure exactly one leading slash, rejecting anything that would move the
/// request off the named resource
pub fn normalize_path(resource_path: &str) -> Result<String, String> {
    let trimmed = resource_path.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err("resource path is required".to_string());
    }
    if trimmed.contains(URL_SPECIAL) {
        return Err(format!(
            "resource path '{}' must not contain '?', '#', '%' or '\\'",
            resource_path
        ));
    }
    if trimmed.split('/').any(is_dot_segment) {
        return Err(format!(
            "resource path '{}' must not contain '.' or '..' segments",
            resource_path
        ));
    }
    Ok(format!("/{}", trimmed))
}

/// Append `id` as exactly one path segment
fn join_id(path: &str, id: &str) -> Result<String, String> {
    if id.contains('/') || id.contains(URL_SPECIAL) {
        return Err(format!(
            "resource id '{}' must not contain '/', '?', '#', '%' or '\\'",
            id
        ));
    }
    if is_dot_segment(id) {
        return Err(format!("resource id '{}' is not a valid path segment", id));
    }
    Ok(format!("{}/{}", path.trim_end_matches('/'), id))
}

fn target_path(kind: OperationKind, path: &str, input: &OperationInput) -> Result<String, CrestError> {
    match input.effective_id() {
        Some(id) => join_id(path, id).map_err(|e| invalid(kind, e)),
        None => Ok(path.to_string()),
    }
}

fn require_object(kind: OperationKind, payload: Option<&Value>) -> Result<&Map<String, Value>, CrestError> {
    payload
        .and_then(Value::as_object)
        .ok_or_else(|| invalid(kind, "payload must be a JSON object"))
}

fn strip_id(payload: &Map<String, Value>) -> Value {
    let mut body = payload.clone();
    body.remove(params::ID_FIELD);
    Value::Object(body)
}

/// Render a payload value as a query parameter; `null` is dropped
fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(None)
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(normalize_path("users").unwrap(), "/users");
        assert_eq!(normalize_path("/users").unwrap(), "/users");
        assert_eq!(normalize_path("//users").unwrap(), "/users");
        assert_eq!(normalize_path("realms/root/users").unwrap(), "/realms/root/users");
        assert!(normalize_path("").is_err());
        assert!(normalize_path("/").is_err());

        for raw in ["users", "a/b", "groups/admins", "x"] {
            let request = builder().build(OperationKind::Read, &OperationInput::new(raw)).unwrap();
            assert_eq!(request.path, format!("/json/{}", raw));
            assert!(!request.path.contains("//"));
        }
    }

    #[test]
    fn test_create_without_id_posts_with_create_action() {
        let input = OperationInput::new("/users").with_payload(json!({"name": "alice"}));
        let request = builder().build(OperationKind::Create, &input).unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/json/users");
        assert_eq!(request.query("_action"), Some("create"));
        assert_eq!(request.query("realm"), Some("/"));
        assert_eq!(request.header("If-None-Match"), None);
        assert_eq!(request.body, Some(json!({"name": "alice"})));
    }

    #[test]
    fn test_create_with_id_puts_if_none_match() {
        let input = OperationInput::new("users")
            .with_id("alice")
            .with_payload(json!({"name": "alice"}));
        let request = builder().build(OperationKind::Create, &input).unwrap();

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/json/users/alice");
        assert_eq!(request.header("If-None-Match"), Some("*"));
        assert_eq!(request.query("_action"), None);
    }

    #[test]
    fn test_create_with_empty_id_falls_back_to_post() {
        let input = OperationInput::new("users").with_id("").with_payload(json!({}));
        let request = builder().build(OperationKind::Create, &input).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query("_action"), Some("create"));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let no_payload = OperationInput::new("users");
        let err = builder().build(OperationKind::Create, &no_payload).unwrap_err();
        assert!(matches!(err, CrestError::Validation(_)));

        let array_payload = OperationInput::new("users").with_payload(json!(["alice"]));
        assert!(builder().build(OperationKind::Create, &array_payload).is_err());

        let slashed_id = OperationInput::new("users").with_id("a/b").with_payload(json!({}));
        assert!(builder().build(OperationKind::Create, &slashed_id).is_err());
    }

    #[test]
    fn test_ids_that_would_leave_the_segment_are_rejected() {
        for id in ["alice#bob", "alice?x=1", "alice%2Fbob", "a\\b", ".", ".."] {
            let delete = OperationInput::new("users").with_id(id);
            let err = builder().build(OperationKind::Delete, &delete).unwrap_err();
            assert!(matches!(err, CrestError::Validation(_)), "id {:?} accepted", id);

            let create = OperationInput::new("users").with_id(id).with_payload(json!({}));
            assert!(builder().build(OperationKind::Create, &create).is_err(), "id {:?} accepted", id);
        }

        let dotted = OperationInput::new("users").with_id("alice.smith");
        let request = builder().build(OperationKind::Read, &dotted).unwrap();
        assert_eq!(request.path, "/json/users/alice.smith");
    }

    #[test]
    fn test_paths_with_url_syntax_are_rejected() {
        for raw in ["users#x", "users?_action=delete", "users/../realms", "./users", "users/%2e%2e", "users\\alice"] {
            assert!(normalize_path(raw).is_err(), "path {:?} accepted", raw);
            let err = builder().build(OperationKind::Read, &OperationInput::new(raw)).unwrap_err();
            assert!(matches!(err, CrestError::Validation(_)));
        }
        assert_eq!(normalize_path("users/.well-known").unwrap(), "/users/.well-known");
    }

    #[test]
    fn test_update_strips_id_and_sets_if_match() {
        let input = OperationInput::new("users/alice")
            .with_payload(json!({"_id": "alice", "name": "alice2"}))
            .with_realm("/");
        let request = builder().build(OperationKind::Update, &input).unwrap();

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/json/users/alice");
        assert_eq!(request.header("If-Match"), Some("*"));
        assert_eq!(request.body, Some(json!({"name": "alice2"})));
    }

    #[test]
    fn test_update_joins_id_segment() {
        let input = OperationInput::new("/users")
            .with_id("bob")
            .with_payload(json!({"_id": "bob", "mail": "bob@example.com"}));
        let request = builder().build(OperationKind::Update, &input).unwrap();

        assert_eq!(request.path, "/json/users/bob");
        assert_eq!(request.body, Some(json!({"mail": "bob@example.com"})));
    }

    #[test]
    fn test_patch_uses_patch_method() {
        let object = OperationInput::new("users/alice").with_payload(json!({"_id": "alice", "mail": "a@x"}));
        let request = builder().build(OperationKind::Patch, &object).unwrap();
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.header("If-Match"), Some("*"));
        assert_eq!(request.body, Some(json!({"mail": "a@x"})));

        let ops = json!([{"operation": "replace", "field": "mail", "value": "a@x"}]);
        let array = OperationInput::new("users/alice").with_payload(ops.clone());
        let request = builder().build(OperationKind::Patch, &array).unwrap();
        assert_eq!(request.body, Some(ops));

        let scalar = OperationInput::new("users/alice").with_payload(json!("mail"));
        assert!(builder().build(OperationKind::Patch, &scalar).is_err());
    }

    #[test]
    fn test_delete_has_if_match_and_no_body() {
        let input = OperationInput::new("users").with_id("alice");
        let request = builder().build(OperationKind::Delete, &input).unwrap();

        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.path, "/json/users/alice");
        assert_eq!(request.header("If-Match"), Some("*"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_action_requires_name() {
        let input = OperationInput::new("sessions")
            .with_action("logout")
            .with_payload(json!({}));
        let request = builder().build(OperationKind::Action, &input).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query("_action"), Some("logout"));
        assert_eq!(request.body, Some(json!({})));

        let unnamed = OperationInput::new("sessions").with_action("  ").with_payload(json!({}));
        assert!(builder().build(OperationKind::Action, &unnamed).is_err());
    }

    #[test]
    fn test_query_requires_filter_or_id() {
        let missing = OperationInput::new("users").with_payload(json!({"_pageSize": 10}));
        let err = builder().build(OperationKind::Query, &missing).unwrap_err();
        assert!(matches!(err, CrestError::Validation(_)));

        // Non-string criteria do not count
        let numeric = OperationInput::new("users").with_payload(json!({"_queryFilter": true}));
        assert!(builder().build(OperationKind::Query, &numeric).is_err());

        let by_id = OperationInput::new("users").with_payload(json!({"_queryId": "*"}));
        assert!(builder().build(OperationKind::Query, &by_id).is_ok());
    }

    #[test]
    fn test_query_renders_payload_as_params() {
        let input = OperationInput::new("users").with_payload(json!({
            "_queryFilter": "userName sw \"a\"",
            "_pageSize": 10,
            "_fields": ["userName", "mail"],
            "_totalPagedResults": null,
            "realm": "/ignored"
        }));
        let request = RequestBuilder::new(Some("/alpha".to_string()))
            .build(OperationKind::Query, &input)
            .unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query("_queryFilter"), Some("userName sw \"a\""));
        assert_eq!(request.query("_pageSize"), Some("10"));
        assert_eq!(request.query("_fields"), Some("userName,mail"));
        assert_eq!(request.query("_totalPagedResults"), None);
        assert_eq!(request.query("realm"), Some("/alpha"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_every_request_carries_protocol_headers() {
        let input = OperationInput::new("users")
            .with_action("idFromSession")
            .with_payload(json!({"_queryId": "*"}));

        for kind in OperationKind::ALL {
            let request = builder().build(kind, &input).unwrap();
            assert_eq!(request.header("Accept-API-Version"), Some("protocol=2.0,resource=1.0"));
            assert_eq!(request.query("realm"), Some("/"));
        }
    }

    #[test]
    fn test_realm_resolution_order() {
        let configured = RequestBuilder::new(Some("/employees".to_string()));

        let explicit = OperationInput::new("users").with_realm("/partners");
        let request = configured.build(OperationKind::Read, &explicit).unwrap();
        assert_eq!(request.query("realm"), Some("/partners"));

        let implicit = OperationInput::new("users");
        let request = configured.build(OperationKind::Read, &implicit).unwrap();
        assert_eq!(request.query("realm"), Some("/employees"));
    }
}
