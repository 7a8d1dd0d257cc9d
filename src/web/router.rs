use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::constants::{COURSES_DIR, MEDIA_URL_PREFIX};
use crate::web::state::AppState;
use crate::web::{admin, api, auth, pages, pwa};

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/courses", get(pages::courses))
        .route("/courses/:slug", get(pages::course_detail))
        .route("/courses/:slug/enroll", post(pages::enroll))
        .route("/courses/:slug/learn/:lesson_slug", get(pages::lesson))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/manifest.json", get(pwa::manifest))
        .route("/service-worker.js", get(pwa::service_worker))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", get(auth::login_page).post(auth::login_submit))
        .route("/admin/logout", post(auth::logout).get(auth::logout))
        .route("/admin/courses", get(admin::courses))
        .route("/admin/courses/new", get(admin::new_course).post(admin::create_course))
        .route("/admin/courses/:id/edit", get(admin::edit_course).post(admin::update_course))
        .route("/admin/courses/:id/delete", post(admin::delete_course))
        .route("/admin/courses/:id/lessons", get(admin::lessons))
        .route("/admin/courses/:id/lessons/new", get(admin::new_lesson).post(admin::create_lesson))
        .route(
            "/admin/courses/:id/lessons/:lesson_id/edit",
            get(admin::edit_lesson).post(admin::update_lesson),
        )
        .route("/admin/courses/:id/lessons/:lesson_id/delete", post(admin::delete_lesson))
        .route("/admin/registrations", get(admin::registrations))
        .route("/admin/registrations/:id/status", post(admin::update_registration_status))
}

fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/courses", get(api::list_courses))
        .route("/api/courses/:slug", get(api::course_by_slug))
        .route("/api/categories", get(api::categories))
        .route(
            "/api/registrations",
            post(api::create_registration)
                .get(api::list_registrations)
                .put(api::update_registration),
        )
        .route(
            "/api/admin/courses",
            post(api::create_course)
                .put(api::update_course)
                .delete(api::delete_course),
        )
        .route("/api/admin/courses/:id", get(api::get_course))
        .route("/api/admin/courses/:id/lessons", get(api::course_lessons))
        .route(
            "/api/admin/lessons",
            post(api::create_lesson)
                .put(api::update_lesson)
                .delete(api::delete_lesson),
        )
        .route("/api/admin/lessons/:id", get(api::get_lesson))
        .route(
            "/api/upload",
            post(api::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/auth/login", post(auth::api_login))
        .route("/api/auth/logout", post(auth::api_logout))
}

/// Every page, API route and static directory of the site.
pub fn app_router(state: AppState) -> Router {
    let media_dir = state.config.storage.upload_root.join(COURSES_DIR);
    let media_path = format!("{MEDIA_URL_PREFIX}/{COURSES_DIR}");

    Router::new()
        .merge(page_routes())
        .merge(admin_routes())
        .merge(api_routes(state.config.storage.max_upload_bytes))
        .nest_service(&media_path, ServeDir::new(media_dir))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(pages::not_found)
        .with_state(state)
}
