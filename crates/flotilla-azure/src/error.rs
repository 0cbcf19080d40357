use flotilla_core::{ClientError, Operation};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token request failed: {0}")]
    Auth(String),

    #[error("azure returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("{operation} operation {status}: {message}")]
    Operation {
        operation: Operation,
        status: String,
        message: String,
    },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("config: {0}")]
    Config(String),
}

impl From<AzureError> for ClientError {
    fn from(e: AzureError) -> Self {
        match e {
            AzureError::Http(e) => ClientError::Request(e.to_string()),
            AzureError::Json(e) => ClientError::InvalidResponse(e.to_string()),
            AzureError::Auth(msg) => ClientError::Auth(msg),
            AzureError::Api {
                status,
                code,
                message,
            } => ClientError::Rejected {
                status,
                message: format!("{code}: {message}"),
            },
            AzureError::Operation {
                operation,
                status,
                message,
            } => ClientError::OperationFailed {
                operation,
                status,
                message,
            },
            AzureError::InvalidResponse(msg) | AzureError::Config(msg) => {
                ClientError::InvalidResponse(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_operation_keeps_its_kind() {
        let err: ClientError = AzureError::Operation {
            operation: Operation::Delete,
            status: "Canceled".into(),
            message: "superseded".into(),
        }
        .into();
        assert_eq!(err.to_string(), "delete ended as Canceled: superseded");
        assert!(matches!(
            err,
            ClientError::OperationFailed {
                operation: Operation::Delete,
                ..
            }
        ));
    }

    #[test]
    fn api_error_becomes_rejection() {
        let err: ClientError = AzureError::Api {
            status: 409,
            code: "Conflict".into(),
            message: "busy".into(),
        }
        .into();
        assert_eq!(
            err,
            ClientError::Rejected {
                status: 409,
                message: "Conflict: busy".into()
            }
        );
    }
}
