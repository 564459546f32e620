pub mod custom;
pub mod fixture;
pub mod gemini;

pub use custom::CustomApiBackend;
pub use fixture::FixtureBackend;
pub use gemini::GeminiBackend;

use anyhow::{anyhow, Result};

/// Turn a ureq error into the retryable error shown to the user.
pub(crate) fn request_error(err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, response) => anyhow!(
            "API request failed: {} {}",
            code,
            response.status_text()
        ),
        ureq::Error::Transport(transport) => anyhow!("API request failed: {}", transport),
    }
}

/// Read a response body as JSON; an unparseable body becomes `Null`.
pub(crate) fn read_json_body(response: ureq::Response) -> Result<serde_json::Value> {
    let body = response
        .into_string()
        .map_err(|e| anyhow!("read provider response: {}", e))?;
    Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
        log::warn!("provider response is not JSON: {}", e);
        serde_json::Value::Null
    }))
}
