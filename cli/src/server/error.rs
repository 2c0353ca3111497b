use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use sage_core::error::{AgentError, RetrievalError};
use sage_core::Error;

/// Every error from the HTTP layer serialises as `{"detail": "<message>"}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                detail: detail.into(),
            },
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Retrieval(RetrievalError::NotLoaded) => {
                Self::unavailable("RAG service not initialized")
            }
            Error::Agent(AgentError::InvalidQuery { message }) => Self::bad_request(message),
            Error::Llm(e) => Self::new(
                StatusCode::BAD_GATEWAY,
                format!("Generation backend failed: {}", e),
            ),
            other => Self::internal(format!("Error processing query: {}", other)),
        }
    }
}
