//! Turns failures into `{"error": "..."}` responses.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{BirdLensError, MediaError, SearchError, TagError};

/// An error on its way back to a client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("request failed ({}): {}", self.status, self.message);
        } else {
            tracing::debug!("request refused ({}): {}", self.status, self.message);
        }

        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Which status a library error deserves.
fn status_of(err: &BirdLensError) -> StatusCode {
    match err {
        BirdLensError::TagError(e) => match e {
            TagError::NotFound(_) | TagError::ValueNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        },

        BirdLensError::SearchError(SearchError::InvalidKey(_)) => StatusCode::BAD_REQUEST,

        BirdLensError::MediaError(e) => match e {
            MediaError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            MediaError::MediaDoesntExist { .. } => StatusCode::NOT_FOUND,
            MediaError::NoPhoto
            | MediaError::NoFileName
            | MediaError::ExtensionNotAllowed(_)
            | MediaError::NotLocalMedia(_)
            | MediaError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            MediaError::WriteFailed { .. } | MediaError::ImageError(..) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },

        BirdLensError::PhotoNotFound { .. } => StatusCode::NOT_FOUND,

        BirdLensError::DatabaseError(_)
        | BirdLensError::ConfigError(_)
        | BirdLensError::TokioJoinError(_)
        | BirdLensError::ServeFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<BirdLensError> for ApiError {
    fn from(err: BirdLensError) -> Self {
        let status = status_of(&err);

        // the inner error reads better than the wrapper for clients
        let message = match &err {
            BirdLensError::TagError(e) => e.to_string(),
            BirdLensError::SearchError(e) => e.to_string(),
            BirdLensError::MediaError(e) => e.to_string(),
            other => other.to_string(),
        };

        Self::new(status, message)
    }
}

impl From<TagError> for ApiError {
    fn from(err: TagError) -> Self {
        BirdLensError::from(err).into()
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        BirdLensError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::ApiError;
    use crate::error::{BirdLensError, MediaError, TagError};

    #[test]
    fn statuses_follow_the_error() {
        let cases: Vec<(BirdLensError, StatusCode)> = vec![
            (TagError::AlreadyExists("species".into()).into(), StatusCode::BAD_REQUEST),
            (TagError::SystemTag("date_clicked".into()).into(), StatusCode::BAD_REQUEST),
            (TagError::NotFound("nope".into()).into(), StatusCode::NOT_FOUND),
            (TagError::InvalidName("Bird-Name".into()).into(), StatusCode::BAD_REQUEST),
            (
                TagError::StillReferenced {
                    target: "continent".into(),
                    child: "location".into(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                TagError::ValueNotFound {
                    tag: "species".into(),
                    value: "Dodo".into(),
                }
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                MediaError::TooLarge { size: 2, limit: 1 }.into(),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                MediaError::ExtensionNotAllowed("gif".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                BirdLensError::PhotoNotFound { id: "x".into() },
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn messages_are_the_inner_error() {
        let err = ApiError::from(TagError::AlreadyExists("species".into()));
        assert_eq!(err.message(), "Tag `species` already exists.");
    }
}
