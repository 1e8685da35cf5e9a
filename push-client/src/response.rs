//! Response classification and decoding.

use crate::error::{ApiError, ClientError, Result};
use crate::transport::HttpResponse;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// HTTP status the service uses to ask for a two-factor code.
pub const STATUS_TWO_FACTOR: u16 = 412;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    request: String,
    #[serde(default)]
    errors: Vec<String>,
}

/// Map an error status to a typed error. Statuses below 400 pass.
pub fn check_status(response: &HttpResponse) -> Result<()> {
    if response.status == STATUS_TWO_FACTOR {
        return Err(ClientError::TwoFactorRequired);
    }
    if response.status < 400 {
        return Ok(());
    }

    let text = String::from_utf8_lossy(&response.body).trim().to_string();
    let (status, request_id, mut messages) = match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => (body.status, body.request, body.errors),
        Err(_) => (0, String::new(), Vec::new()),
    };
    if messages.is_empty() && !text.is_empty() {
        messages.push(text);
    }

    Err(ClientError::Api(ApiError {
        status: if status == 0 {
            i64::from(response.status)
        } else {
            status
        },
        request_id,
        messages,
    }))
}

/// Check the status, then decode the body as `T`.
pub fn decode_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    check_status(response)?;
    serde_json::from_slice(&response.body).map_err(ClientError::Decode)
}
