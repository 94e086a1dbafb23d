use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orders_types::domain::order::OrderError;
use orders_types::ports::order_repository::RepoError;
use orders_types::response::ApiResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::AlreadyInStatus(_)
            | OrderError::InvalidTransition { .. }
            | OrderError::Finalized(_)
            | OrderError::NotCreated(_) => AppError::Conflict(err.to_string()),
            OrderError::UnknownStatus(ref status) => {
                tracing::error!(%status, "order carries a status outside the lifecycle");
                AppError::Internal(err.into())
            }
            OrderError::EmptyOrderId
            | OrderError::EmptyUserId
            | OrderError::NoItems
            | OrderError::InvalidItem { .. }
            | OrderError::NonPositiveTotal(_)
            | OrderError::TotalOverflow => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(_) => AppError::Conflict(err.to_string()),
            RepoError::DbError(_) | RepoError::Corrupt(_) => AppError::Internal(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };

        (code, Json(ApiResponse::<()>::error(msg))).into_response()
    }
}
