//! OAuth2 token request construction
//!
//! Pure functions: merging call-level client credentials with configured
//! defaults, validating them, and laying out the grant-specific form fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use crate::api::constants;
use crate::api::error::CrestError;

/// Supported OAuth2 grant types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    Password,
    ClientCredentials,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::Password => "password",
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

impl FromStr for GrantType {
    type Err = CrestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "authorization_code" => Ok(GrantType::AuthorizationCode),
            "password" => Ok(GrantType::Password),
            "client_credentials" => Ok(GrantType::ClientCredentials),
            other => Err(CrestError::validation(format!("unsupported grant type '{}'", other))),
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the client id and secret travel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// HTTP Basic credentials
    #[default]
    Basic,
    /// `client_id`/`client_secret` form fields
    Body,
}

impl FromStr for AuthMethod {
    type Err = CrestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "client_secret_basic" => Ok(AuthMethod::Basic),
            "body" | "post" | "client_secret_post" => Ok(AuthMethod::Body),
            other => Err(CrestError::validation(format!("unknown client auth method '{}'", other))),
        }
    }
}

/// Requested scope, as a space-separated string or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scope {
    One(String),
    Many(Vec<String>),
}

impl Scope {
    /// Form value for the scope: lists are joined by single spaces, strings pass
    /// through unchanged. Empty scopes yield `None`.
    pub fn normalize(&self) -> Option<String> {
        let value = match self {
            Scope::One(scope) => scope.clone(),
            Scope::Many(scopes) => scopes
                .iter()
                .filter(|s| !s.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        };
        (!value.trim().is_empty()).then_some(value)
    }
}

impl From<&str> for Scope {
    fn from(scope: &str) -> Self {
        Scope::One(scope.to_string())
    }
}

impl From<Vec<String>> for Scope {
    fn from(scopes: Vec<String>) -> Self {
        Scope::Many(scopes)
    }
}

/// Grant-specific parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    AuthorizationCode { code: String, redirect_uri: String },
    Password { username: String, password: String },
    ClientCredentials,
}

impl Grant {
    pub fn grant_type(&self) -> GrantType {
        match self {
            Grant::AuthorizationCode { .. } => GrantType::AuthorizationCode,
            Grant::Password { .. } => GrantType::Password,
            Grant::ClientCredentials => GrantType::ClientCredentials,
        }
    }
}

/// Configured client used when a call leaves fields empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDefaults {
    pub client_id: String,
    pub client_secret: String,
    pub auth_method: AuthMethod,
    pub realm: Option<String>,
}

/// Resolved client credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    /// Merge call-level credentials over the configured defaults.
    ///
    /// A call value is used when present and non-empty, otherwise the default
    /// applies. Fails if either field is still empty.
    pub fn merge(
        call_id: Option<&str>,
        call_secret: Option<&str>,
        defaults: &ClientDefaults,
    ) -> Result<Self, CrestError> {
        let client_id = prefer_call_value(call_id, &defaults.client_id);
        let client_secret = prefer_call_value(call_secret, &defaults.client_secret);

        if client_id.is_empty() {
            return Err(CrestError::validation("client_id is required"));
        }
        if client_secret.is_empty() {
            return Err(CrestError::validation("client_secret is required"));
        }

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

fn prefer_call_value(call: Option<&str>, default: &str) -> String {
    call.filter(|v| !v.is_empty()).unwrap_or(default).to_string()
}

/// One token request as issued by a caller
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRequest {
    pub grant: Grant,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_method: Option<AuthMethod>,
    pub scope: Option<Scope>,
    pub realm: Option<String>,
}

impl TokenRequest {
    pub fn new(grant: Grant) -> Self {
        Self {
            grant,
            client_id: None,
            client_secret: None,
            auth_method: None,
            scope: None,
            realm: None,
        }
    }

    pub fn authorization_code(code: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self::new(Grant::AuthorizationCode {
            code: code.into(),
            redirect_uri: redirect_uri.into(),
        })
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(Grant::Password {
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn client_credentials() -> Self {
        Self::new(Grant::ClientCredentials)
    }

    pub fn with_client(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_auth_method(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = Some(auth_method);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }
}

/// Fully laid-out token endpoint call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequestDescriptor {
    pub realm: String,
    pub form: Vec<(String, String)>,
    /// Client id and secret for HTTP Basic, when that method is selected
    pub basic_auth: Option<(String, String)>,
}

impl TokenRequestDescriptor {
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Validate a token request and lay out its form and credentials
pub fn build_token_request(
    request: &TokenRequest,
    defaults: &ClientDefaults,
) -> Result<TokenRequestDescriptor, CrestError> {
    let credentials = ClientCredentials::merge(
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
        defaults,
    )?;

    let mut form: Vec<(String, String)> = Vec::new();
    let mut push = |key: &str, value: &str| form.push((key.to_string(), value.to_string()));

    push("grant_type", request.grant.grant_type().as_str());
    match &request.grant {
        Grant::AuthorizationCode { code, redirect_uri } => {
            require_field("code", code)?;
            require_field("redirect_uri", redirect_uri)?;
            push("code", code);
            push("redirect_uri", redirect_uri);
        }
        Grant::Password { username, password } => {
            require_field("username", username)?;
            require_field("password", password)?;
            push("username", username);
            push("password", password);
            if let Some(scope) = request.scope.as_ref().and_then(Scope::normalize) {
                push("scope", &scope);
            }
        }
        Grant::ClientCredentials => {
            if let Some(scope) = request.scope.as_ref().and_then(Scope::normalize) {
                push("scope", &scope);
            }
        }
    }

    let auth_method = request.auth_method.unwrap_or(defaults.auth_method);
    let basic_auth = match auth_method {
        AuthMethod::Basic => Some((credentials.client_id, credentials.client_secret)),
        AuthMethod::Body => {
            push("client_id", &credentials.client_id);
            push("client_secret", &credentials.client_secret);
            None
        }
    };

    Ok(TokenRequestDescriptor {
        realm: constants::resolve_realm(request.realm.as_deref(), defaults.realm.as_deref()),
        form,
        basic_auth,
    })
}

fn require_field(name: &str, value: &str) -> Result<(), CrestError> {
    if value.is_empty() {
        Err(CrestError::validation(format!("{} is required", name)))
    } else {
        Ok(())
    }
}

/// Successful token endpoint response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
