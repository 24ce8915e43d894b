//! OAuth2 token exchange engine
//!
//! Grant-specific token requests against `/oauth2/access_token` and a per-realm
//! cache of OpenID Connect discovery documents.

pub mod discovery;
pub mod exchange;
pub mod token;

pub use discovery::DiscoveryCache;
pub use exchange::TokenExchange;
pub use token::{
    build_token_request, AuthMethod, ClientCredentials, ClientDefaults, Grant, GrantType, Scope,
    TokenRequest, TokenRequestDescriptor, TokenResponse,
};
