use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Fill in all fields correctly")]
    Validation(Vec<String>),

    #[error("Login required")]
    LoginRequired { return_to: String },

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// User-facing text for unexpected store/runtime failures. Details stay in the logs.
const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

#[derive(Serialize)]
struct ErrorData {
    errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), vec![]),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, self.to_string(), vec![msg.clone()]),
            AppError::Validation(messages) => (
                StatusCode::BAD_REQUEST,
                self.to_string(),
                messages.clone(),
            ),
            AppError::LoginRequired { return_to } => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("returnUrl", return_to)
                    .finish();
                return Redirect::to(&format!("/login?{query}")).into_response();
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string(), vec![]),
            AppError::DbError(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UNEXPECTED_ERROR.to_string(),
                    vec![],
                )
            }
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "orm error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UNEXPECTED_ERROR.to_string(),
                    vec![],
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UNEXPECTED_ERROR.to_string(),
                    vec![],
                )
            }
        };

        let body = ApiResponse {
            message,
            data: Some(ErrorData { errors }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
