use super::commands::config::ConfigCommands;
use super::commands::resource::{ActionArgs, CreateArgs, PayloadArgs, TargetArgs};
use super::commands::token::TokenCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "am-crest")]
#[command(about = "A CLI tool for AM CREST resources and OAuth2 tokens")]
#[command(version)]
pub struct Cli {
    /// AM deployment URL, overriding the configured server
    #[arg(long, global = true)]
    pub server: Option<String>,
    /// Realm for this call, overriding the configured default
    #[arg(long, global = true)]
    pub realm: Option<String>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a resource, server-assigned id unless --id is given
    Create(CreateArgs),
    /// Read a resource
    Read(TargetArgs),
    /// Replace a resource
    Update(PayloadArgs),
    /// Delete a resource
    Delete(TargetArgs),
    /// Partially modify a resource
    Patch(PayloadArgs),
    /// Invoke a named action on a resource or collection
    Action(ActionArgs),
    /// Query a collection with _queryFilter or _queryId
    Query(PayloadArgs),
    /// Request an OAuth2 token
    Token(TokenCommands),
    /// Show the realm's OpenID Connect discovery document
    Discovery,
    /// Configuration management
    Config(ConfigCommands),
}
