use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

use crate::pages;

#[derive(Debug, Error)]
pub enum AppError {
    // Required form field left empty
    #[error("{0}")]
    Validation(String),
    // Username already registered
    #[error("{0}")]
    Conflict(String),
    // Bad credentials
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    #[error("You are not the author of this post.")]
    Forbidden,
    // Protected operation reached without a signed-in user
    #[error("Login required.")]
    LoginRequired,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Errors a form handler shows back to the user instead of failing.
    pub fn is_form_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Conflict(_) | Self::Auth(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::Conflict(_) | Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::LoginRequired => return Redirect::to("/auth/login").into_response(),
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    pages::error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong."),
                )
                    .into_response();
            }
        };

        (status, pages::error_page(status, &self.to_string())).into_response()
    }
}
