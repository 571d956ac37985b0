use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize streak data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write streak data: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote store returned {0}")]
    Status(reqwest::StatusCode),
}
