use clap::{Args, Subcommand};

#[derive(Args)]
pub struct TokenCommands {
    #[command(subcommand)]
    pub command: TokenSubcommands,
}

/// Client settings shared by every grant; unset values come from the config
#[derive(Args, Debug, Default)]
pub struct TokenOptions {
    /// OAuth2 client id
    #[arg(long)]
    pub client_id: Option<String>,
    /// OAuth2 client secret
    #[arg(long)]
    pub client_secret: Option<String>,
    /// Client authentication: basic or body
    #[arg(long)]
    pub auth_method: Option<String>,
    /// Requested scopes, space separated or repeated
    #[arg(long, num_args = 1..)]
    pub scope: Vec<String>,
}

#[derive(Subcommand)]
pub enum TokenSubcommands {
    /// Resource owner password grant
    Password {
        /// Resource owner username
        username: String,
        /// Resource owner password, prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        #[command(flatten)]
        options: TokenOptions,
    },
    /// Client credentials grant
    ClientCredentials {
        #[command(flatten)]
        options: TokenOptions,
    },
    /// Exchange an authorization code
    AuthorizationCode {
        /// Authorization code returned to the redirect URI
        code: String,
        /// Redirect URI used in the authorization request
        #[arg(long)]
        redirect_uri: Option<String>,
        #[command(flatten)]
        options: TokenOptions,
    },
}
