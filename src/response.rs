use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{ApiErrorBody, Error, ErrorPayload, Result};

/// Decodes a 2xx body as `R`, or turns any other status into [`Error::Status`]
/// carrying the body decoded as `E`.
#[instrument(skip(response), fields(status = %response.status(), url = %response.url()))]
pub(crate) async fn handle_response<R, E>(response: reqwest::Response) -> Result<R>
where
    R: DeserializeOwned,
    E: ApiErrorBody,
{
    let status = response.status();
    let entity_type = std::any::type_name::<R>()
        .split("::")
        .last()
        .unwrap_or("Unknown");
    debug!(%status, entity_type, "received response");

    if !status.is_success() {
        return Err(error_from_response::<E>(response).await);
    }

    let text = response.text().await?;
    debug!("Response body size: {} bytes", text.len());
    trace!("Response text:\n{}", text);

    // An empty 2xx body decodes like `null`, so `()` and `Option<_>` targets work.
    let json = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(json).map_err(|e| {
        error!(
            "Deserialization error: {}, near position: {} - response text around that position: {}",
            e,
            e.column(),
            text.chars()
                .skip(e.column().saturating_sub(30))
                .take(100)
                .collect::<String>()
        );
        Error::DeserializationError(e, Some(text))
    })
}

/// Streams a 2xx body into `writer`, returning the number of bytes written.
#[instrument(skip(response, writer), fields(status = %response.status(), url = %response.url()))]
pub(crate) async fn stream_response<E, W>(
    mut response: reqwest::Response,
    writer: &mut W,
) -> Result<u64>
where
    E: ApiErrorBody,
    W: AsyncWrite + Unpin + ?Sized,
{
    if !response.status().is_success() {
        return Err(error_from_response::<E>(response).await);
    }

    let mut written = 0_u64;
    while let Some(chunk) = response.chunk().await? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    debug!(written, "streamed response body");
    Ok(written)
}

async fn error_from_response<E: ApiErrorBody>(response: reqwest::Response) -> Error {
    let status = response.status();
    let url = response.url().to_string();

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!(%status, "failed to read error response body: {}", e);
            return Error::Status {
                status,
                url,
                payload: None,
                response_body: None,
            };
        }
    };

    let payload: Option<ErrorPayload> = match serde_json::from_str::<E>(&text) {
        Ok(body) => Some(body.into()),
        Err(e) => {
            debug!(%status, "error body did not match the expected shape: {}", e);
            None
        }
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(%url, "lexoffice rate limit exceeded");
    } else {
        warn!(%status, %url, "unexpected status code");
    }

    Error::Status {
        status,
        url,
        payload,
        response_body: Some(text),
    }
}
