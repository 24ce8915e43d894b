use log::{debug, info, warn};
use serde_json::Value;

use super::discovery::DiscoveryCache;
use super::token::{build_token_request, ClientDefaults, TokenRequest, TokenResponse};
use crate::api::client::{build_http_client, DEFAULT_TIMEOUT};
use crate::api::constants::{self, params};
use crate::api::error::CrestError;
use crate::api::response;

/// OAuth2 token exchange against the AM token endpoint.
///
/// Token calls are never retried: grant and client rejections are terminal and
/// returned as [`CrestError::Grant`] with the server's error body.
pub struct TokenExchange {
    base_url: String,
    http_client: reqwest::Client,
    defaults: ClientDefaults,
    discovery: DiscoveryCache,
}

impl TokenExchange {
    pub fn new(base_url: impl Into<String>, defaults: ClientDefaults) -> Result<Self, CrestError> {
        let http_client = build_http_client(DEFAULT_TIMEOUT)?;
        Ok(Self::with_custom_client(base_url, http_client, defaults))
    }

    pub fn with_custom_client(
        base_url: impl Into<String>,
        http_client: reqwest::Client,
        defaults: ClientDefaults,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
            defaults,
            discovery: DiscoveryCache::new(),
        }
    }

    pub fn defaults(&self) -> &ClientDefaults {
        &self.defaults
    }

    pub fn discovery_cache(&self) -> &DiscoveryCache {
        &self.discovery
    }

    /// Issue a token request: validate, build, POST once, decode
    pub async fn issue_token(&self, request: &TokenRequest) -> Result<TokenResponse, CrestError> {
        let descriptor = build_token_request(request, &self.defaults)?;
        let url = constants::token_endpoint(&self.base_url);
        info!(
            "Requesting {} token in realm {}",
            request.grant.grant_type(),
            descriptor.realm
        );

        let mut builder = self
            .http_client
            .post(&url)
            .query(&[(params::REALM, descriptor.realm.as_str())])
            .form(&descriptor.form);
        if let Some((client_id, client_secret)) = &descriptor.basic_auth {
            builder = builder.basic_auth(client_id, Some(client_secret));
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response::read_grant_json(response).await.map_err(|e| {
            warn!("Token request failed: {}", e);
            e
        })?;

        serde_json::from_value::<TokenResponse>(body.clone()).map_err(|e| {
            warn!("Token endpoint returned no usable token: {}", e);
            CrestError::Grant { status, body }
        })
    }

    /// Fetch the OpenID Connect discovery document for a realm, memoized per realm
    pub async fn fetch_openid_configuration(&self, realm: Option<&str>) -> Result<Value, CrestError> {
        let realm = constants::resolve_realm(realm, self.defaults.realm.as_deref());
        let url = constants::discovery_endpoint(&self.base_url);
        let http_client = self.http_client.clone();
        let query_realm = realm.clone();

        self.discovery
            .get_or_fetch(&realm, move || async move {
                debug!("GET {} (realm {})", url, query_realm);
                let response = http_client
                    .get(&url)
                    .query(&[(params::REALM, query_realm.as_str())])
                    .send()
                    .await?;
                response::read_json(response).await
            })
            .await
    }
}
