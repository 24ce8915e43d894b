//! Response decoding shared by CREST and OAuth2 calls

use super::error::CrestError;
use serde_json::Value;

/// Decode a response body: empty is `null`, non-JSON text is kept as a string
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

async fn status_and_body(response: reqwest::Response) -> Result<(u16, bool, Value), CrestError> {
    let status = response.status();
    let text = response.text().await?;
    Ok((status.as_u16(), status.is_success(), decode_body(&text)))
}

/// Decode a CREST response, classifying failures by status
pub async fn read_json(response: reqwest::Response) -> Result<Value, CrestError> {
    let (status, success, body) = status_and_body(response).await?;
    if success {
        Ok(body)
    } else {
        Err(CrestError::from_status(status, body))
    }
}

/// Decode a token endpoint response; every failure status is a grant error
pub async fn read_grant_json(response: reqwest::Response) -> Result<Value, CrestError> {
    let (status, success, body) = status_and_body(response).await?;
    if success {
        Ok(body)
    } else {
        Err(CrestError::Grant { status, body })
    }
}
