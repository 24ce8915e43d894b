use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// JSON payload given inline or read from a file
#[derive(Args, Debug, Default)]
pub struct PayloadSource {
    /// Inline JSON payload
    #[arg(short, long, conflicts_with = "data_file")]
    pub data: Option<String>,
    /// Path to a file containing the JSON payload
    #[arg(long, value_name = "FILE")]
    pub data_file: Option<PathBuf>,
}

impl PayloadSource {
    /// Parse the payload, `None` when neither source was given
    pub fn load(&self) -> Result<Option<Value>> {
        let raw = match (&self.data, &self.data_file) {
            (Some(data), _) => data.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read payload file: {}", path.display()))?,
            (None, None) => return Ok(None),
        };

        let payload = serde_json::from_str(&raw).context("Payload is not valid JSON")?;
        Ok(Some(payload))
    }

    /// Parse the payload, defaulting to an empty object
    pub fn load_or_empty(&self) -> Result<Value> {
        Ok(self.load()?.unwrap_or_else(|| Value::Object(Default::default())))
    }
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Resource path below /json, e.g. users/demo
    pub path: String,
    /// Resource id appended to the path
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Collection path below /json, e.g. users
    pub path: String,
    /// Create exactly this id, failing if it exists; defaults to the payload's _id
    #[arg(long)]
    pub id: Option<String>,
    #[command(flatten)]
    pub payload: PayloadSource,
}

#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// Resource path below /json
    pub path: String,
    /// Resource id appended to the path; defaults to the payload's _id
    #[arg(long)]
    pub id: Option<String>,
    #[command(flatten)]
    pub payload: PayloadSource,
}

#[derive(Args, Debug)]
pub struct ActionArgs {
    /// Resource or collection path below /json
    pub path: String,
    /// Action name sent as _action
    #[arg(short, long)]
    pub action: String,
    #[command(flatten)]
    pub payload: PayloadSource,
}
