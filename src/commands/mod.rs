pub mod config;
pub mod resource;
pub mod token;

use anyhow::Result;
use serde_json::Value;

/// Print a result document as pretty JSON on stdout
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
