use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show the current configuration with secrets masked
    Show,
    /// Set the AM server and agent credentials
    SetServer {
        /// Deployment base URL, e.g. https://am.example.com/openam
        url: String,
        /// Default realm
        #[arg(long)]
        realm: Option<String>,
        /// Agent username
        #[arg(short, long)]
        username: Option<String>,
        /// Agent password, prompted for when --username is given without it
        #[arg(short, long)]
        password: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Set the OAuth2 client defaults
    SetOauth2 {
        /// OAuth2 client id
        #[arg(long)]
        client_id: Option<String>,
        /// OAuth2 client secret
        #[arg(long)]
        client_secret: Option<String>,
        /// Client authentication: basic or body
        #[arg(long)]
        auth_method: Option<String>,
        /// Default redirect URI for the authorization code grant
        #[arg(long)]
        redirect_uri: Option<String>,
        /// Default scope
        #[arg(long)]
        scope: Option<String>,
    },
}
