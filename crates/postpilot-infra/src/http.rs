//! Shared helpers for outbound HTTP calls.

use postpilot_core::ports::GatewayError;

pub(crate) fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Pass 2xx responses through; turn anything else into [`GatewayError::Status`]
/// carrying the upstream body.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}
