//! Errors encountered during API requests or reported by the identity service.
use anyhow::Result;
use reqwest::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// The identity service rejected the request as invalid.
#[derive(Debug, thiserror::Error)]
#[error("the identity service rejected the request ({code}): {message}")]
pub struct ClientError {
    pub code: u16,
    pub message: String,
}

/// The identity service returned an empty API response.
#[derive(Debug, thiserror::Error)]
#[error("the identity service returned an empty API response")]
pub struct EmptyResponse;

/// Invalid API response received.
#[derive(Debug, thiserror::Error)]
#[error("invalid API response received: {response}")]
pub struct InvalidResponse {
    pub response: String,
}

/// The identity service did not return a token on authentication.
#[derive(Debug, thiserror::Error)]
#[error("the identity service did not return an X-Subject-Token header")]
pub struct MissingSubjectToken;

/// No password is stored for the operator administrative user.
#[derive(Debug, thiserror::Error)]
#[error("no password is stored for the operator administrative user '{0}'")]
pub struct MissingCredentials(pub String);

/// The resource is not available, or access to it is restricted.
#[derive(Debug, thiserror::Error)]
#[error("the resource is not available, or access to it is restricted")]
pub struct ResourceNotFound;

/// The identity service failed to process the API request.
#[derive(Debug, thiserror::Error)]
#[error("the identity service failed to process the API request ({code}): {message}")]
pub struct ServerError {
    pub code: u16,
    pub message: String,
}

/// Error document returned by the identity API.
#[derive(Debug, Deserialize)]
struct ErrorDocument {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    message: String,
}

/// Decode the body of an HTTP response and correctly handle errors in the process.
pub async fn inspect<T>(response: Response) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let code = response.status();
    let text = response.text().await?;

    if matches!(code, StatusCode::NOT_FOUND) {
        anyhow::bail!(ResourceNotFound);
    }

    if code.is_client_error() || code.is_server_error() {
        let message = match serde_json::from_str::<ErrorDocument>(&text) {
            Ok(document) => document.error.message,
            Err(_) => text,
        };
        let code = code.as_u16();
        if (400..500).contains(&code) {
            anyhow::bail!(ClientError { code, message });
        }
        anyhow::bail!(ServerError { code, message });
    }

    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<T>(&text)
        .map_err(|error| {
            let decode = InvalidResponse { response: text };
            anyhow::anyhow!(error).context(decode)
        })
        .map(Some)
}

/// Like [`inspect`] but fail with [`EmptyResponse`] when the response has no body.
pub async fn expect<T>(response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    match inspect(response).await? {
        None => anyhow::bail!(EmptyResponse),
        Some(value) => Ok(value),
    }
}
