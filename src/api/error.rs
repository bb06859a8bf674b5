//! API error type and the JSON body extractor that feeds it.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::io::store::StoreError;
use crate::ops::entity_ops::EntityError;
use crate::ops::group_ops::GroupError;
use crate::ops::task_ops::TaskError;

/// Every failure an endpoint can report. Each variant maps to one HTTP
/// status; `NotFound` additionally carries the machine-readable code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    NotFound { code: &'static str, message: String },
    #[error("{0}")]
    TypeMismatch(String),
    #[error("{0}")]
    StorageRead(String),
    #[error("{0}")]
    StorageWrite(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::TypeMismatch(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::StorageRead(_) | ApiError::StorageWrite(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound { code, .. } => *code,
            ApiError::TypeMismatch(_) => "TYPE_MISMATCH",
            ApiError::StorageRead(_) => "DATA_FILE_READ_ERROR",
            ApiError::StorageWrite(_) => "DATA_FILE_WRITE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn not_found(code: &'static str, message: impl ToString) -> Self {
        ApiError::NotFound {
            code,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Read { .. } | StoreError::Parse { .. } => ApiError::StorageRead(e.to_string()),
            StoreError::Write { .. } | StoreError::Serialize(_) | StoreError::AlreadyExists(_) => {
                ApiError::StorageWrite(e.to_string())
            }
        }
    }
}

impl From<GroupError> for ApiError {
    fn from(e: GroupError) -> Self {
        match e {
            GroupError::NotFound(_) => ApiError::not_found("GROUP_NOT_FOUND", e),
            GroupError::ParentNotFound(_) => ApiError::not_found("PARENT_NOT_FOUND", e),
            GroupError::TypeMismatch { .. } => ApiError::TypeMismatch(e.to_string()),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::NotFound(_) => ApiError::not_found("TASK_NOT_FOUND", e),
            TaskError::ProjectNotFound(_) => ApiError::not_found("PROJECT_NOT_FOUND", e),
            TaskError::SectionNotFound { .. } => ApiError::not_found("SECTION_NOT_FOUND", e),
            TaskError::NoProject(_) => ApiError::Validation(e.to_string()),
        }
    }
}

impl From<EntityError> for ApiError {
    fn from(e: EntityError) -> Self {
        match e {
            EntityError::ProjectNotFound(_) => ApiError::not_found("PROJECT_NOT_FOUND", e),
            EntityError::LabelNotFound(_) => ApiError::not_found("LABEL_NOT_FOUND", e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// `Json<T>` that reports malformed bodies as a 400 `VALIDATION_ERROR`
/// instead of axum's plain-text 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ValidatedJson(value))
    }
}
