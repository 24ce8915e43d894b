//! Core operation types for CREST resource calls

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::api::error::CrestError;

/// The seven CREST operations exposed by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    Patch,
    Action,
    Query,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Create,
        OperationKind::Read,
        OperationKind::Update,
        OperationKind::Delete,
        OperationKind::Patch,
        OperationKind::Action,
        OperationKind::Query,
    ];

    /// Get the operation type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Action => "action",
            Self::Query => "query",
        }
    }

    /// Whether the operation needs a JSON payload
    pub fn requires_payload(&self) -> bool {
        !matches!(self, Self::Read | Self::Delete)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = CrestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CrestError::validation(format!("unknown operation '{}'", s)))
    }
}

/// Normalized input every gateway operation reduces to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationInput {
    /// Resource path below `/json`, with or without a leading slash
    pub resource_path: String,
    /// Resource id: the target of a create-with-id, or a path segment for
    /// read/update/delete/patch
    pub id: Option<String>,
    /// JSON payload
    pub payload: Option<Value>,
    /// Action name, for `action` only
    pub action: Option<String>,
    /// Explicit realm, overriding the configured default
    pub realm: Option<String>,
}

impl OperationInput {
    pub fn new(resource_path: impl Into<String>) -> Self {
        Self {
            resource_path: resource_path.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Id if present and non-empty
    pub fn effective_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}
