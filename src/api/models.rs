use serde::{Deserialize, Serialize};

/// Server information exposed by `/json/serverinfo/*`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub cookie_name: String,
}

/// Agent session returned by `/json/authenticate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    pub token_id: String,
}

/// Session credentials attached to one CREST call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub cookie_name: String,
    pub token: String,
}

impl Session {
    pub fn new(cookie_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            token: token.into(),
        }
    }
}
