use super::constants;
use super::error::CrestError;
use super::models::Session;
use super::operations::{OperationInput, OperationKind, RequestBuilder, RequestDescriptor};
use super::resilience::{ApiLogger, OperationContext, ResilienceConfig, RetryPolicy};
use super::response;
use super::session::SessionProvider;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Default request timeout for AM calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the pooled HTTP client shared by the gateway, the token exchange and
/// the agent session provider
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, CrestError> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("am-crest/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CrestError::Transport(format!("failed to build HTTP client: {}", e)))
}

/// CREST resource gateway.
///
/// Each call validates and builds its request up front, then runs it under the
/// re-authenticating retry policy with the session supplied by the provider.
#[derive(Clone)]
pub struct CrestClient {
    base_url: String,
    http_client: reqwest::Client,
    sessions: Arc<dyn SessionProvider>,
    request_builder: RequestBuilder,
    retry_policy: RetryPolicy,
    api_logger: ApiLogger,
}

impl CrestClient {
    pub fn new(
        base_url: impl Into<String>,
        sessions: Arc<dyn SessionProvider>,
        default_realm: Option<String>,
    ) -> Result<Self, CrestError> {
        let http_client = build_http_client(DEFAULT_TIMEOUT)?;
        Ok(Self::with_custom_client(base_url, http_client, sessions, default_realm))
    }

    /// Create a new client with custom HTTP client configuration
    pub fn with_custom_client(
        base_url: impl Into<String>,
        http_client: reqwest::Client,
        sessions: Arc<dyn SessionProvider>,
        default_realm: Option<String>,
    ) -> Self {
        let resilience = ResilienceConfig::default();
        Self {
            base_url: base_url.into(),
            http_client,
            sessions,
            request_builder: RequestBuilder::new(default_realm),
            retry_policy: RetryPolicy::new(resilience.retry),
            api_logger: ApiLogger::new(resilience.monitoring),
        }
    }

    pub fn with_resilience(mut self, resilience: ResilienceConfig) -> Self {
        self.retry_policy = RetryPolicy::new(resilience.retry);
        self.api_logger = ApiLogger::new(resilience.monitoring);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_realm(&self) -> Option<&str> {
        self.request_builder.default_realm()
    }

    /// Create a resource. With an id the server is asked to create exactly that
    /// resource and fail if it exists; without one the server assigns the id.
    pub async fn create_resource(
        &self,
        resource_path: &str,
        id: Option<&str>,
        payload: Value,
        realm: Option<&str>,
    ) -> Result<Value, CrestError> {
        let mut input = OperationInput::new(resource_path).with_payload(payload);
        input.id = id.map(str::to_string);
        input.realm = realm.map(str::to_string);
        self.execute(OperationKind::Create, &input).await
    }

    pub async fn read_resource(&self, resource_path: &str, realm: Option<&str>) -> Result<Value, CrestError> {
        let mut input = OperationInput::new(resource_path);
        input.realm = realm.map(str::to_string);
        self.execute(OperationKind::Read, &input).await
    }

    /// Unconditionally replace a resource
    pub async fn update_resource(
        &self,
        resource_path: &str,
        payload: Value,
        realm: Option<&str>,
    ) -> Result<Value, CrestError> {
        let mut input = OperationInput::new(resource_path).with_payload(payload);
        input.realm = realm.map(str::to_string);
        self.execute(OperationKind::Update, &input).await
    }

    pub async fn delete_resource(&self, resource_path: &str, realm: Option<&str>) -> Result<Value, CrestError> {
        let mut input = OperationInput::new(resource_path);
        input.realm = realm.map(str::to_string);
        self.execute(OperationKind::Delete, &input).await
    }

    /// Partially modify a resource
    pub async fn patch_resource(
        &self,
        resource_path: &str,
        payload: Value,
        realm: Option<&str>,
    ) -> Result<Value, CrestError> {
        let mut input = OperationInput::new(resource_path).with_payload(payload);
        input.realm = realm.map(str::to_string);
        self.execute(OperationKind::Patch, &input).await
    }

    pub async fn action_resource(
        &self,
        resource_path: &str,
        action: &str,
        payload: Value,
        realm: Option<&str>,
    ) -> Result<Value, CrestError> {
        let mut input = OperationInput::new(resource_path)
            .with_action(action)
            .with_payload(payload);
        input.realm = realm.map(str::to_string);
        self.execute(OperationKind::Action, &input).await
    }

    /// Query a collection; the payload must carry `_queryFilter` or `_queryId`
    pub async fn query_resource(
        &self,
        resource_path: &str,
        payload: Value,
        realm: Option<&str>,
    ) -> Result<Value, CrestError> {
        let mut input = OperationInput::new(resource_path).with_payload(payload);
        input.realm = realm.map(str::to_string);
        self.execute(OperationKind::Query, &input).await
    }

    /// Execute a normalized operation
    pub async fn execute(&self, kind: OperationKind, input: &OperationInput) -> Result<Value, CrestError> {
        // Validation errors surface here, before the retry policy or any I/O
        let request = self.request_builder.build(kind, input)?;

        let context = self.api_logger.start_operation(kind.as_str(), &request.path);
        let attempts = AtomicU32::new(0);

        let result = self
            .retry_policy
            .execute(kind.as_str(), self.sessions.as_ref(), |session| {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.send(&context, &request, session)
            })
            .await;

        let error = result.as_ref().err();
        let metrics = context.create_metrics(
            attempts.load(Ordering::SeqCst),
            error.and_then(CrestError::status_code),
            error.map(CrestError::kind),
        );
        self.api_logger.complete_operation(&context, &metrics);

        result
    }

    /// Perform one HTTP exchange carrying `session`
    async fn send(
        &self,
        context: &OperationContext,
        request: &RequestDescriptor,
        session: Session,
    ) -> Result<Value, CrestError> {
        let url = constants::crest_url(&self.base_url, &request.path);

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .query(&request.query_params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.header(session.cookie_name.as_str(), session.token.as_str());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let mut logged_headers = request.headers.clone();
        logged_headers.insert(session.cookie_name.clone(), session.token.clone());
        self.api_logger.log_request(
            context,
            request.method.as_str(),
            &url,
            &logged_headers,
            &[session.cookie_name.as_str()],
        );

        let request_start = Instant::now();
        let response = builder.send().await?;
        self.api_logger
            .log_response(context, response.status().as_u16(), request_start.elapsed());

        response::read_json(response).await
    }
}
