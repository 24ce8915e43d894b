pub mod config;
pub mod resource;
pub mod token;

pub use config::{ConfigCommands, ConfigSubcommands};
pub use resource::{ActionArgs, CreateArgs, PayloadArgs, PayloadSource, TargetArgs};
pub use token::{TokenCommands, TokenOptions, TokenSubcommands};
