//! Cookie gate for the back office.
//!
//! A successful login stores `sha256(secret:username)` in the `admin-session`
//! cookie. Requests are admitted when the cookie matches the token derived
//! from the current configuration, so changing the secret logs everyone out.

use crate::config::AdminConfig;
use crate::constants::{ADMIN_COOKIE, ADMIN_LOGIN_PATH};
use crate::error::AcademyError;
use crate::web::error::{ApiError, PageResult};
use crate::web::state::AppState;
use crate::web::templates::{render, AdminLoginTemplate};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub fn session_token(secret: &str, username: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(username.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn credentials_match(admin: &AdminConfig, credentials: &Credentials) -> bool {
    constant_time_eq(credentials.username.as_bytes(), admin.username.as_bytes())
        && constant_time_eq(credentials.password.as_bytes(), admin.password.as_bytes())
}

/// Value of a cookie from the request's `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

pub fn is_admin(headers: &HeaderMap, admin: &AdminConfig) -> bool {
    let expected = session_token(&admin.session_secret, &admin.username);
    cookie_value(headers, ADMIN_COOKIE)
        .is_some_and(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()))
}

pub fn session_cookie(admin: &AdminConfig) -> String {
    format!(
        "{ADMIN_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        session_token(&admin.session_secret, &admin.username),
        admin.session_max_age_secs
    )
}

pub fn clear_session_cookie() -> String {
    format!("{ADMIN_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

fn with_cookie(mut response: Response, cookie: String) -> Response {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Could not encode session cookie: {}", e),
    }
    response
}

/// Extractor admitting only admin sessions on JSON endpoints (401 otherwise).
pub struct AdminApi;

#[async_trait]
impl FromRequestParts<AppState> for AdminApi {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_admin(&parts.headers, &state.config.admin) {
            Ok(AdminApi)
        } else {
            Err(ApiError(AcademyError::Unauthorized))
        }
    }
}

/// Extractor admitting only admin sessions on back-office pages, redirecting to the login form otherwise.
pub struct AdminPage;

#[async_trait]
impl FromRequestParts<AppState> for AdminPage {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_admin(&parts.headers, &state.config.admin) {
            Ok(AdminPage)
        } else {
            Err(Redirect::to(ADMIN_LOGIN_PATH))
        }
    }
}

// JSON endpoints

pub async fn api_login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(credentials) = payload?;
    let admin = &state.config.admin;

    if !credentials_match(admin, &credentials) {
        warn!(username = %credentials.username, "Rejected admin login");
        let body = Json(json!({ "error": "Invalid credentials" }));
        return Ok((StatusCode::UNAUTHORIZED, body).into_response());
    }

    info!(username = %credentials.username, "Admin logged in");
    let response = Json(json!({ "success": true })).into_response();
    Ok(with_cookie(response, session_cookie(admin)))
}

pub async fn api_logout() -> Response {
    with_cookie(
        Json(json!({ "success": true })).into_response(),
        clear_session_cookie(),
    )
}

// Pages

pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> PageResult<Response> {
    if is_admin(&headers, &state.config.admin) {
        return Ok(Redirect::to("/admin").into_response());
    }
    Ok(render(&AdminLoginTemplate::default())?.into_response())
}

pub async fn login_submit(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> PageResult<Response> {
    let admin = &state.config.admin;

    if !credentials_match(admin, &credentials) {
        warn!(username = %credentials.username, "Rejected admin login");
        let page = AdminLoginTemplate {
            username: credentials.username,
            error: Some("نام کاربری یا رمز عبور اشتباه است".to_string()),
        };
        return Ok((StatusCode::UNAUTHORIZED, render(&page)?).into_response());
    }

    info!(username = %credentials.username, "Admin logged in");
    Ok(with_cookie(
        Redirect::to("/admin").into_response(),
        session_cookie(admin),
    ))
}

pub async fn logout() -> Response {
    with_cookie(
        Redirect::to(ADMIN_LOGIN_PATH).into_response(),
        clear_session_cookie(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AdminConfig {
        AdminConfig {
            username: "owner".to_string(),
            password: "pw".to_string(),
            session_secret: "secret".to_string(),
            session_max_age_secs: 60,
        }
    }

    #[test]
    fn token_depends_on_secret_and_user() {
        let a = session_token("secret", "owner");
        assert_eq!(a.len(), 64);
        assert_eq!(a, session_token("secret", "owner"));
        assert_ne!(a, session_token("other", "owner"));
        assert_ne!(a, session_token("secret", "admin"));
    }

    #[test]
    fn cookie_header_is_checked() {
        let admin = admin();
        let mut headers = HeaderMap::new();
        assert!(!is_admin(&headers, &admin));

        let cookie = format!("theme=dark; {ADMIN_COOKIE}={}", session_token("secret", "owner"));
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert!(is_admin(&headers, &admin));

        headers.insert(header::COOKIE, HeaderValue::from_static("admin-session=forged"));
        assert!(!is_admin(&headers, &admin));
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie(&admin());
        assert!(cookie.starts_with("admin-session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.ends_with("Max-Age=60"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn credentials_must_both_match() {
        let admin = admin();
        let ok = Credentials {
            username: "owner".to_string(),
            password: "pw".to_string(),
        };
        let wrong = Credentials {
            username: "owner".to_string(),
            password: "nope".to_string(),
        };
        assert!(credentials_match(&admin, &ok));
        assert!(!credentials_match(&admin, &wrong));
    }
}
