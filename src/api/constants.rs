//! API Constants for the AM CREST and OAuth2 endpoints

/// Prefix for every CREST resource path
pub const CREST_BASE_PATH: &str = "/json";

/// OAuth2 token endpoint
pub const TOKEN_ENDPOINT: &str = "/oauth2/access_token";

/// OpenID Connect discovery document
pub const DISCOVERY_ENDPOINT: &str = "/oauth2/.well-known/openid-configuration";

/// Server information used to learn the session cookie name
pub const SERVER_INFO_ENDPOINT: &str = "/json/serverinfo/*";

/// Agent login endpoint
pub const AUTHENTICATE_ENDPOINT: &str = "/json/authenticate";

/// Realm used when neither the call nor the configuration names one
pub const DEFAULT_REALM: &str = "/";

/// Session cookie name AM ships with, used when serverinfo omits it
pub const DEFAULT_COOKIE_NAME: &str = "iPlanetDirectoryPro";

/// Standard headers for CREST requests
pub mod headers {
    pub const ACCEPT_API_VERSION: &str = "Accept-API-Version";

    /// CREST protocol 2.0, resource 1.0
    pub const CREST_API_VERSION: &str = "protocol=2.0,resource=1.0";

    /// Version pinned for the legacy authenticate endpoint
    pub const AUTHENTICATE_API_VERSION: &str = "resource=2.0,protocol=1.0";

    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    pub const IF_MATCH: &str = "If-Match";
    pub const IF_NONE_MATCH: &str = "If-None-Match";

    /// Matches any revision (or, with If-None-Match, no existing resource)
    pub const ANY_REVISION: &str = "*";

    pub const OPENAM_USERNAME: &str = "X-OpenAM-Username";
    pub const OPENAM_PASSWORD: &str = "X-OpenAM-Password";
}

/// Reserved CREST query parameters
pub mod params {
    pub const ACTION: &str = "_action";
    pub const ACTION_CREATE: &str = "create";
    pub const QUERY_FILTER: &str = "_queryFilter";
    pub const QUERY_ID: &str = "_queryId";
    pub const REALM: &str = "realm";

    /// Resource identifier field inside payloads
    pub const ID_FIELD: &str = "_id";
}

/// Build a full CREST URL from the server base and a normalized path
pub fn crest_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Build the token endpoint URL
pub fn token_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), TOKEN_ENDPOINT)
}

/// Build the discovery endpoint URL
pub fn discovery_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), DISCOVERY_ENDPOINT)
}

/// Build the server info endpoint URL
pub fn server_info_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), SERVER_INFO_ENDPOINT)
}

/// Build the authenticate endpoint URL
pub fn authenticate_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), AUTHENTICATE_ENDPOINT)
}

/// Resolve the realm for a call: explicit argument, then configured default, then `/`
pub fn resolve_realm(explicit: Option<&str>, default: Option<&str>) -> String {
    explicit
        .filter(|r| !r.is_empty())
        .or(default.filter(|r| !r.is_empty()))
        .unwrap_or(DEFAULT_REALM)
        .to_string()
}
