//! JSON endpoints used by the storefront scripts and the admin client.

use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::*;
use crate::error::AcademyError;
use crate::upload::store_course_file;
use crate::web::auth::AdminApi;
use crate::web::error::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

fn parse_id(raw: Option<&str>, what: &str) -> Result<i64, AcademyError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AcademyError::validation(format!("{what} id is required")))?;
    raw.parse()
        .map_err(|_| AcademyError::validation(format!("Invalid {what} id")))
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": crate::constants::SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// Public catalog

pub async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> ApiResult<Json<Vec<CourseSummary>>> {
    Ok(Json(state.catalog.list_published_courses(&filter).await?))
}

pub async fn course_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<CourseDetail>> {
    Ok(Json(state.catalog.course_detail(&slug).await?))
}

pub async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<CategoryWithCount>>> {
    Ok(Json(state.catalog.list_categories().await?))
}

// Registrations

pub async fn create_registration(
    State(state): State<AppState>,
    payload: Result<Json<NewRegistration>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = payload?;
    let registration = state.catalog.create_registration(input).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn list_registrations(
    _: AdminApi,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RegistrationWithCourse>>> {
    Ok(Json(state.catalog.list_registrations().await?))
}

pub async fn update_registration(
    _: AdminApi,
    State(state): State<AppState>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<Registration>> {
    let Json(update) = payload?;
    Ok(Json(state.catalog.apply_status_update(update).await?))
}

// Course administration

pub async fn create_course(
    _: AdminApi,
    State(state): State<AppState>,
    payload: Result<Json<NewCourse>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = payload?;
    let course = state.catalog.create_course(input).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    _: AdminApi,
    State(state): State<AppState>,
    payload: Result<Json<CoursePatch>, JsonRejection>,
) -> ApiResult<Json<Course>> {
    let Json(patch) = payload?;
    Ok(Json(state.catalog.update_course(patch).await?))
}

pub async fn delete_course(
    _: AdminApi,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Value>> {
    let course_id = parse_id(query.id.as_deref(), "course")?;
    state.catalog.delete_course(course_id).await?;
    Ok(success())
}

pub async fn get_course(
    _: AdminApi,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Course>> {
    let course_id = parse_id(Some(&id), "course")?;
    Ok(Json(state.catalog.get_course(course_id).await?))
}

pub async fn course_lessons(
    _: AdminApi,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Lesson>>> {
    let course_id = parse_id(Some(&id), "course")?;
    Ok(Json(state.catalog.list_lessons(course_id).await?))
}

// Lesson administration

pub async fn create_lesson(
    _: AdminApi,
    State(state): State<AppState>,
    payload: Result<Json<NewLesson>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = payload?;
    let lesson = state.catalog.create_lesson(input).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn update_lesson(
    _: AdminApi,
    State(state): State<AppState>,
    payload: Result<Json<LessonPatch>, JsonRejection>,
) -> ApiResult<Json<Lesson>> {
    let Json(patch) = payload?;
    Ok(Json(state.catalog.update_lesson(patch).await?))
}

pub async fn delete_lesson(
    _: AdminApi,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Value>> {
    let lesson_id = parse_id(query.id.as_deref(), "lesson")?;
    state.catalog.delete_lesson(lesson_id).await?;
    Ok(success())
}

pub async fn get_lesson(
    _: AdminApi,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Lesson>> {
    let lesson_id = parse_id(Some(&id), "lesson")?;
    Ok(Json(state.catalog.get_lesson(lesson_id).await?))
}

// Uploads

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError(AcademyError::validation(format!("Invalid upload: {}", e.body_text())))
}

/// Accepts `file` and `courseSlug` multipart fields and stores the file under the course directory.
pub async fn upload(
    _: AdminApi,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut course_slug = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("courseSlug") => {
                course_slug = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes));
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| AcademyError::validation("file is required"))?;
    let course_slug = course_slug
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AcademyError::validation("courseSlug is required"))?;

    let url = store_course_file(
        state.catalog.upload_root(),
        course_slug.trim(),
        &file_name,
        &bytes,
    )
    .await?;

    Ok(Json(json!({ "success": true, "url": url, "fileName": file_name })))
}
