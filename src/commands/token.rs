use anyhow::{Context, Result};
use log::info;

use super::print_json;
use crate::api::{AuthMethod, Scope, TokenExchange, TokenRequest};
use crate::api::client::build_http_client;
use crate::cli::commands::{TokenCommands, TokenOptions, TokenSubcommands};
use crate::config::Config;
use std::time::Duration;

fn exchange(config: &Config) -> Result<TokenExchange> {
    let server = config.validate_server()?;
    let http_client = build_http_client(Duration::from_secs(server.timeout_secs))?;
    Ok(TokenExchange::with_custom_client(
        &server.url,
        http_client,
        config.client_defaults(),
    ))
}

/// Lay out a token request from the command line, filling scope from the config
pub fn token_request(config: &Config, command: TokenSubcommands, realm: Option<String>) -> Result<TokenRequest> {
    let (request, options) = match command {
        TokenSubcommands::Password {
            username,
            password,
            options,
        } => {
            let password = match password {
                Some(password) => password,
                None => rpassword::prompt_password(format!("Password for {}: ", username))
                    .context("Failed to read password")?,
            };
            (TokenRequest::password(username, password), options)
        }
        TokenSubcommands::ClientCredentials { options } => (TokenRequest::client_credentials(), options),
        TokenSubcommands::AuthorizationCode {
            code,
            redirect_uri,
            options,
        } => {
            let redirect_uri = redirect_uri
                .or_else(|| config.oauth2.redirect_uri.clone())
                .unwrap_or_default();
            (TokenRequest::authorization_code(code, redirect_uri), options)
        }
    };

    apply_options(request, options, config, realm)
}

fn apply_options(
    mut request: TokenRequest,
    options: TokenOptions,
    config: &Config,
    realm: Option<String>,
) -> Result<TokenRequest> {
    request.client_id = options.client_id;
    request.client_secret = options.client_secret;
    if let Some(method) = options.auth_method {
        request = request.with_auth_method(method.parse::<AuthMethod>()?);
    }

    request.scope = if options.scope.is_empty() {
        config.oauth2.scope.clone()
    } else {
        Some(Scope::Many(options.scope))
    };
    request.realm = realm;
    Ok(request)
}

pub async fn token_command(config: &Config, command: TokenCommands, realm: Option<String>) -> Result<()> {
    let request = token_request(config, command.command, realm)?;
    info!("Requesting {} token", request.grant.grant_type());

    let token = exchange(config)?.issue_token(&request).await?;
    print_json(&serde_json::to_value(&token)?)
}

pub async fn discovery_command(config: &Config, realm: Option<String>) -> Result<()> {
    let document = exchange(config)?
        .fetch_openid_configuration(realm.as_deref())
        .await?;
    print_json(&document)
}
