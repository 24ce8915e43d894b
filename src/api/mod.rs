//! AM CREST API module
//!
//! Session-authenticated CREST resource operations (create, read, update,
//! delete, patch, action, query) over `/json`, and OAuth2 token issuance.

pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod oauth2;
pub mod operations;
pub mod resilience;
pub mod response;
pub mod session;

pub use client::CrestClient;
pub use error::{CrestError, ErrorKind};
pub use models::{AgentSession, ServerInfo, Session};
pub use oauth2::{AuthMethod, ClientDefaults, DiscoveryCache, Grant, GrantType, Scope, TokenExchange, TokenRequest, TokenResponse};
pub use operations::{OperationInput, OperationKind, RequestBuilder, RequestDescriptor};
pub use resilience::{ApiLogger, LogLevel, MonitoringConfig, ResilienceConfig, RetryConfig, RetryPolicy};
pub use session::{AgentSessionProvider, SessionProvider, StaticSessionProvider};
