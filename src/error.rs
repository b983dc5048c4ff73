use std::path::PathBuf;
use thiserror::Error;

/// Fatal outcomes of a render call. Photo resolution and photo decoding
/// problems never show up here; they degrade to the "No Photo" card instead.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("verification code could not be encoded: {0}")]
    Encoding(String),
    #[error("failed to write certificate to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pdf serialization failed: {0}")]
    Serialize(#[source] std::io::Error),
    #[error("font error: {0}")]
    Font(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("render worker failed: {0}")]
    Task(String),
    #[error("http client could not be initialized: {0}")]
    Client(String),
}

impl CertificateError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CertificateError::Write {
            path: path.into(),
            source,
        }
    }

    /// True for failures caused by the request itself rather than the
    /// environment the renderer runs in.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            CertificateError::Encoding(_) | CertificateError::InvalidRequest(_)
        )
    }
}

impl From<qrcode::types::QrError> for CertificateError {
    fn from(value: qrcode::types::QrError) -> Self {
        CertificateError::Encoding(value.to_string())
    }
}

impl From<reqwest::Error> for CertificateError {
    fn from(value: reqwest::Error) -> Self {
        CertificateError::Client(value.to_string())
    }
}

impl From<tokio::task::JoinError> for CertificateError {
    fn from(value: tokio::task::JoinError) -> Self {
        CertificateError::Task(value.to_string())
    }
}
