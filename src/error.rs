use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::ErrorResponse;

/// Everything that can go wrong while serving a single `/predict` request.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid file type. Please upload an image (jpg/png/webp).")]
    InvalidFileType,

    #[error("File too large. Max 5 MB.")]
    FileTooLarge,

    #[error("Could not decode image.")]
    UndecodableImage,

    #[error("No file uploaded. Send the image in a multipart field named \"file\".")]
    MissingFile,

    #[error("Malformed multipart upload.")]
    MalformedUpload,

    /// The cause is kept for the log line only; clients see a fixed message.
    #[error("Inference failed.")]
    InferenceFailed(String),
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::InvalidFileType
            | PredictError::UndecodableImage
            | PredictError::MalformedUpload => StatusCode::BAD_REQUEST,
            PredictError::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::InferenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

/// Failures that stop the server from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read labels from {path}: {source}")]
    Labels {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load ONNX model from {path}: {message}")]
    Model { path: PathBuf, message: String },
}

impl From<StartupError> for std::io::Error {
    fn from(e: StartupError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(PredictError::InvalidFileType.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PredictError::UndecodableImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PredictError::FileTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            PredictError::MissingFile.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            PredictError::InferenceFailed("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_rt::test]
    async fn inference_failure_hides_cause() {
        let resp = PredictError::InferenceFailed("tensor shape mismatch".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Inference failed.");
    }
}
