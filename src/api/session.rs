//! Session providers supplying the AM session cookie for CREST calls

use super::constants::{self, headers, params};
use super::error::CrestError;
use super::models::{AgentSession, ServerInfo, Session};
use super::response;
use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::Mutex;

/// Source of the session cookie name and token attached to every CREST call.
///
/// Implementations cache whatever they fetch; `invalidate` drops the cached
/// token when it is still the one the server rejected, so the next
/// `agent_session` obtains a fresh one.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn server_info(&self) -> Result<ServerInfo, CrestError>;

    async fn agent_session(&self) -> Result<AgentSession, CrestError>;

    async fn invalidate(&self, rejected: &Session);

    /// Current cookie name and token in one value
    async fn session(&self) -> Result<Session, CrestError> {
        let ServerInfo { cookie_name } = self.server_info().await?;
        let AgentSession { token_id } = self.agent_session().await?;
        Ok(Session::new(cookie_name, token_id))
    }
}

/// Logs in to AM as an agent user and caches the resulting session
pub struct AgentSessionProvider {
    base_url: String,
    realm: String,
    username: String,
    password: String,
    http_client: reqwest::Client,
    server_info: Mutex<Option<ServerInfo>>,
    session: Mutex<Option<AgentSession>>,
}

impl AgentSessionProvider {
    pub fn new(
        base_url: impl Into<String>,
        realm: Option<&str>,
        username: impl Into<String>,
        password: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            realm: constants::resolve_realm(realm, None),
            username: username.into(),
            password: password.into(),
            http_client,
            server_info: Mutex::new(None),
            session: Mutex::new(None),
        }
    }

    async fn fetch_server_info(&self) -> Result<ServerInfo, CrestError> {
        let url = constants::server_info_endpoint(&self.base_url);
        debug!("Fetching server info from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(headers::ACCEPT_API_VERSION, headers::CREST_API_VERSION)
            .send()
            .await?;

        let body = response::read_json(response)
            .await
            .map_err(|e| CrestError::Session(format!("server info unavailable: {}", e)))?;

        let cookie_name = body
            .get("cookieName")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or(constants::DEFAULT_COOKIE_NAME)
            .to_string();

        Ok(ServerInfo { cookie_name })
    }

    async fn login(&self) -> Result<AgentSession, CrestError> {
        let url = constants::authenticate_endpoint(&self.base_url);
        info!("Authenticating agent {} in realm {}", self.username, self.realm);

        let response = self
            .http_client
            .post(&url)
            .header(headers::ACCEPT_API_VERSION, headers::AUTHENTICATE_API_VERSION)
            .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_JSON)
            .header(headers::OPENAM_USERNAME, &self.username)
            .header(headers::OPENAM_PASSWORD, &self.password)
            .query(&[(params::REALM, self.realm.as_str())])
            .body("{}")
            .send()
            .await?;

        let body = response::read_json(response)
            .await
            .map_err(|e| CrestError::Session(format!("agent login failed: {}", e)))?;

        let token_id = body
            .get("tokenId")
            .and_then(|t| t.as_str())
            .ok_or_else(|| CrestError::Session("no tokenId in authenticate response".to_string()))?;

        debug!("Agent session established");
        Ok(AgentSession {
            token_id: token_id.to_string(),
        })
    }
}

#[async_trait]
impl SessionProvider for AgentSessionProvider {
    async fn server_info(&self) -> Result<ServerInfo, CrestError> {
        let mut cached = self.server_info.lock().await;
        if let Some(info) = cached.as_ref() {
            return Ok(info.clone());
        }

        let info = self.fetch_server_info().await?;
        *cached = Some(info.clone());
        Ok(info)
    }

    async fn agent_session(&self) -> Result<AgentSession, CrestError> {
        // Held across the login so concurrent callers share one authentication
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }

        let session = self.login().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    async fn invalidate(&self, rejected: &Session) {
        let mut cached = self.session.lock().await;
        // Another caller may already have replaced the rejected token
        if cached.as_ref().is_some_and(|s| s.token_id == rejected.token) {
            *cached = None;
            info!("Agent session invalidated");
        } else {
            debug!("Rejected agent session already replaced; keeping the cached one");
        }
    }
}

/// Fixed session, for hosts that already hold a token
#[derive(Debug, Clone)]
pub struct StaticSessionProvider {
    session: Session,
}

impl StaticSessionProvider {
    pub fn new(cookie_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            session: Session::new(cookie_name, token),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn server_info(&self) -> Result<ServerInfo, CrestError> {
        Ok(ServerInfo {
            cookie_name: self.session.cookie_name.clone(),
        })
    }

    async fn agent_session(&self) -> Result<AgentSession, CrestError> {
        Ok(AgentSession {
            token_id: self.session.token.clone(),
        })
    }

    async fn invalidate(&self, _rejected: &Session) {
        debug!("Static session cannot be refreshed; keeping the configured token");
    }
}
