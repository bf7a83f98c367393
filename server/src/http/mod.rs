use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use ::api::photo::ErrorResp;

pub mod api;
pub mod svc;

// handler errors
//
// handlers return this so they can use ? all the way through.  the client only
// ever sees the fixed message; whatever caused it goes to the log instead
#[derive(Debug)]
pub(crate) struct AppError {
    status: StatusCode,
    message: &'static str,
    source: Option<anyhow::Error>,
}

impl AppError {
    pub(crate) fn missing_photo() -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            message: "No photo received",
            source: None,
        }
    }

    pub(crate) fn upload(err: anyhow::Error) -> Self {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Upload failed",
            source: Some(err),
        }
    }

    pub(crate) fn gallery(err: anyhow::Error) -> Self {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Gallery load failed",
            source: Some(err),
        }
    }

    // the body was cut off or exceeded the limit while we were reading it
    pub(crate) fn multipart(err: MultipartError) -> Self {
        let status = err.status();

        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "Photo too large"
        } else {
            "Malformed upload"
        };

        AppError {
            status,
            message,
            source: Some(anyhow::Error::msg(err.body_text())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.source {
            error!({ status = %self.status, error = %format!("{err:#}") }, "{}", self.message);
        }

        (
            self.status,
            Json(ErrorResp {
                error: self.message.to_owned(),
            }),
        )
            .into_response()
    }
}
