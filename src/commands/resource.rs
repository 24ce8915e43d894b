use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::print_json;
use crate::api::client::build_http_client;
use crate::api::constants::params;
use crate::api::{
    AgentSessionProvider, CrestClient, OperationInput, OperationKind, ResilienceConfig,
};
use crate::cli::commands::{ActionArgs, CreateArgs, PayloadArgs, TargetArgs};
use crate::config::Config;

/// Build a gateway that logs in with the configured agent account
pub fn connect(config: &Config) -> Result<CrestClient> {
    let server = config.validate_server()?;
    if server.username.is_empty() {
        anyhow::bail!("No agent username configured. Run 'am-crest config set-server <url> --username <name>'");
    }

    let password = if server.password.is_empty() {
        rpassword::prompt_password(format!("Password for {}: ", server.username))
            .context("Failed to read agent password")?
    } else {
        server.password.clone()
    };

    let http_client = build_http_client(Duration::from_secs(server.timeout_secs))?;
    let sessions = Arc::new(AgentSessionProvider::new(
        &server.url,
        server.realm.as_deref(),
        &server.username,
        password,
        http_client.clone(),
    ));
    let resilience = ResilienceConfig::builder()
        .monitoring_config(config.monitoring.clone())
        .build();

    debug!("Connecting to {} as {}", server.url, server.username);
    Ok(
        CrestClient::with_custom_client(&server.url, http_client, sessions, server.realm.clone())
            .with_resilience(resilience),
    )
}

/// Run one operation and print its result
pub async fn run_command(config: &Config, kind: OperationKind, input: OperationInput) -> Result<()> {
    info!("Executing {} on {}", kind, input.resource_path);

    let client = connect(config)?;
    let result = client.execute(kind, &input).await?;
    print_json(&result)
}

pub fn create_input(args: CreateArgs, realm: Option<String>) -> Result<OperationInput> {
    let payload = args.payload.load_or_empty()?;
    let id = args.id.or_else(|| payload_id(&payload));
    Ok(OperationInput {
        resource_path: args.path,
        id,
        payload: Some(payload),
        action: None,
        realm,
    })
}

pub fn target_input(args: TargetArgs, realm: Option<String>) -> OperationInput {
    OperationInput {
        resource_path: args.path,
        id: args.id,
        payload: None,
        action: None,
        realm,
    }
}

/// Input for update, patch and query; the id falls back to the payload's `_id`
pub fn payload_input(args: PayloadArgs, realm: Option<String>) -> Result<OperationInput> {
    let payload = args.payload.load()?;
    let id = args
        .id
        .or_else(|| payload.as_ref().and_then(payload_id));
    Ok(OperationInput {
        resource_path: args.path,
        id,
        payload,
        action: None,
        realm,
    })
}

pub fn action_input(args: ActionArgs, realm: Option<String>) -> Result<OperationInput> {
    Ok(OperationInput {
        resource_path: args.path,
        id: None,
        payload: Some(args.payload.load_or_empty()?),
        action: Some(args.action),
        realm,
    })
}

fn payload_id(payload: &Value) -> Option<String> {
    payload
        .get(params::ID_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
