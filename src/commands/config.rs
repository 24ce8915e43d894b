use anyhow::{Context, Result};
use log::info;

use crate::api::{AuthMethod, Scope};
use crate::cli::commands::{ConfigCommands, ConfigSubcommands};
use crate::config::Config;

pub fn config_command(command: ConfigCommands) -> Result<()> {
    let mut config = Config::load()?;

    match command.command {
        ConfigSubcommands::Show => {
            show(&config);
            Ok(())
        }
        ConfigSubcommands::SetServer {
            url,
            realm,
            username,
            password,
            timeout,
        } => {
            let password = match (&username, password) {
                (Some(name), None) => Some(
                    rpassword::prompt_password(format!("Password for {}: ", name))
                        .context("Failed to read agent password")?,
                ),
                (_, password) => password,
            };
            set_server(&mut config, url, realm, username, password, timeout);
            config.save()?;
            println!("Server set to {}", config.server.url);
            Ok(())
        }
        ConfigSubcommands::SetOauth2 {
            client_id,
            client_secret,
            auth_method,
            redirect_uri,
            scope,
        } => {
            if let Some(client_id) = client_id {
                config.oauth2.client_id = client_id;
            }
            if let Some(client_secret) = client_secret {
                config.oauth2.client_secret = client_secret;
            }
            if let Some(method) = auth_method {
                config.oauth2.auth_method = method.parse::<AuthMethod>()?;
            }
            if redirect_uri.is_some() {
                config.oauth2.redirect_uri = redirect_uri;
            }
            if let Some(scope) = scope {
                config.oauth2.scope = Some(Scope::One(scope));
            }
            config.save()?;
            println!("OAuth2 client defaults updated");
            Ok(())
        }
    }
}

fn set_server(
    config: &mut Config,
    url: String,
    realm: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<u64>,
) {
    info!("Setting server to {}", url);
    config.server.url = url.trim_end_matches('/').to_string();
    if realm.is_some() {
        config.server.realm = realm;
    }
    if let Some(username) = username {
        config.server.username = username;
    }
    if let Some(password) = password {
        config.server.password = password;
    }
    if let Some(timeout) = timeout {
        config.server.timeout_secs = timeout;
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "(not set)" } else { "********" }
}

fn show(config: &Config) {
    println!("AM CREST Configuration");
    println!("======================");
    println!("Server:");
    println!("  URL: {}", or_unset(&config.server.url));
    println!("  Realm: {}", config.server.realm.as_deref().unwrap_or("/"));
    println!("  Username: {}", or_unset(&config.server.username));
    println!("  Password: {}", mask(&config.server.password));
    println!("  Timeout: {}s", config.server.timeout_secs);
    println!("OAuth2:");
    println!("  Client ID: {}", or_unset(&config.oauth2.client_id));
    println!("  Client secret: {}", mask(&config.oauth2.client_secret));
    println!("  Auth method: {:?}", config.oauth2.auth_method);
    println!(
        "  Redirect URI: {}",
        config.oauth2.redirect_uri.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Scope: {}",
        config
            .oauth2
            .scope
            .as_ref()
            .and_then(Scope::normalize)
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("Monitoring:");
    println!("  Log level: {:?}", config.monitoring.log_level);
    println!("  Request logging: {}", config.monitoring.request_logging);
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}
