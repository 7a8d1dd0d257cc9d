use crate::error::AcademyError;
use crate::web::templates::ErrorTemplate;
use askama::Template;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

pub fn status_for(err: &AcademyError) -> StatusCode {
    match err {
        AcademyError::NotFound(_) => StatusCode::NOT_FOUND,
        AcademyError::Validation(_) | AcademyError::Json(_) => StatusCode::BAD_REQUEST,
        AcademyError::Conflict(_) => StatusCode::CONFLICT,
        AcademyError::Unauthorized => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message shown to the client. Server-side failures are logged and hidden.
fn public_message(err: &AcademyError, status: StatusCode) -> String {
    if status.is_server_error() {
        error!("Request failed: {}", err);
        "Internal server error".to_string()
    } else {
        err.to_string()
    }
}

/// Error returned by JSON endpoints as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub AcademyError);

impl From<AcademyError> for ApiError {
    fn from(err: AcademyError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AcademyError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = public_message(&self.0, status);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Error returned by HTML pages, rendered with the site layout.
#[derive(Debug)]
pub struct PageError(pub AcademyError);

impl From<AcademyError> for PageError {
    fn from(err: AcademyError) -> Self {
        PageError(err)
    }
}

impl From<askama::Error> for PageError {
    fn from(err: askama::Error) -> Self {
        PageError(AcademyError::Template(err))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = public_message(&self.0, status);
        error_page(status, message)
    }
}

pub fn error_page(status: StatusCode, message: String) -> Response {
    let page = ErrorTemplate {
        code: status.as_u16(),
        message,
    };
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Failed to render error page: {}", e);
            (status, page.message).into_response()
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
pub type PageResult<T> = std::result::Result<T, PageError>;
