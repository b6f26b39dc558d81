//! HTTP client factory and error classification shared by the backends.

use std::time::Duration;

use crate::error::{Error, Result, SourceFailure};

const MAX_ERROR_BODY: usize = 512;

/// Build a `reqwest::Client` whose every request is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))
}

/// Map a transport error onto the candidate-source taxonomy.
pub fn classify(err: &reqwest::Error, timeout: Duration) -> SourceFailure {
    if err.is_timeout() {
        SourceFailure::Timeout(timeout)
    } else if err.is_decode() {
        SourceFailure::Malformed(err.to_string())
    } else {
        SourceFailure::Unreachable(err.to_string())
    }
}

/// Pass successful responses through; turn anything else into
/// `SourceFailure::Status` carrying a truncated body.
pub async fn ensure_success(response: reqwest::Response) -> std::result::Result<reqwest::Response, SourceFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(SourceFailure::Status { status: status.as_u16(), body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_http_client(Duration::from_millis(250)).is_ok());
    }
}
