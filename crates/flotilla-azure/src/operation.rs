use async_trait::async_trait;
use flotilla_core::{ClientError, HandleRef, Operation, OperationHandle, ReadyHandle};
use reqwest::{Response, StatusCode, header::HeaderMap};
use tracing::trace;

use crate::{client::Transport, error::AzureError, wire::OperationStatus};

const ASYNC_OPERATION: &str = "Azure-AsyncOperation";
const LOCATION: &str = "Location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracking {
    /// Status resource with a `status` field.
    AsyncOperation,
    /// Polled until it stops answering 202.
    Location,
}

/// Handle for an ARM long-running operation.
pub struct LroHandle {
    operation: Operation,
    transport: Transport,
    url: String,
    tracking: Tracking,
}

impl LroHandle {
    /// Pick the tracking header from an accepted response, or a ready handle if there is none.
    pub(crate) fn from_response(
        operation: Operation,
        transport: &Transport,
        response: &Response,
    ) -> HandleRef {
        match tracking_url(response.headers()) {
            Some((url, tracking)) => Box::new(LroHandle {
                operation,
                transport: transport.clone(),
                url,
                tracking,
            }),
            None => ReadyHandle::boxed(),
        }
    }

    async fn poll(&mut self) -> Result<bool, AzureError> {
        let response = self.transport.get(&self.url).await?;
        trace!(target: "flotilla.azure.lro", operation = %self.operation, url = %self.url, status = %response.status(), "operation probed");

        match self.tracking {
            Tracking::Location => match response.status() {
                StatusCode::ACCEPTED => Ok(false),
                StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(true),
                _ => Err(Transport::api_error(response).await),
            },
            Tracking::AsyncOperation => {
                if !response.status().is_success() {
                    return Err(Transport::api_error(response).await);
                }
                let body = response.text().await?;
                let op: OperationStatus = serde_json::from_str(&body).map_err(|e| {
                    AzureError::InvalidResponse(format!("operation status: {e}, body: {body}"))
                })?;
                match op.status.as_str() {
                    "Succeeded" => Ok(true),
                    "Failed" | "Canceled" => Err(AzureError::Operation {
                        operation: self.operation,
                        message: op.error.map(|e| e.message).unwrap_or_default(),
                        status: op.status,
                    }),
                    _ => Ok(false),
                }
            }
        }
    }
}

#[async_trait]
impl OperationHandle for LroHandle {
    async fn done(&mut self) -> Result<bool, ClientError> {
        self.poll().await.map_err(ClientError::from)
    }
}

fn tracking_url(headers: &HeaderMap) -> Option<(String, Tracking)> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    header(ASYNC_OPERATION)
        .map(|url| (url, Tracking::AsyncOperation))
        .or_else(|| header(LOCATION).map(|url| (url, Tracking::Location)))
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn async_operation_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://l"));
        headers.insert(ASYNC_OPERATION, HeaderValue::from_static("https://a"));
        assert_eq!(
            tracking_url(&headers),
            Some(("https://a".to_string(), Tracking::AsyncOperation))
        );
    }

    #[test]
    fn falls_back_to_location() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://l"));
        assert_eq!(
            tracking_url(&headers),
            Some(("https://l".to_string(), Tracking::Location))
        );
        assert_eq!(tracking_url(&HeaderMap::new()), None);
    }
}
