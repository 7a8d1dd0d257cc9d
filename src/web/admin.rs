//! Back-office pages. Every handler takes [`AdminPage`], which redirects
//! anonymous visitors to the login form.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::domain::{Course, RegistrationStatus};
use crate::error::{AcademyError, Result};
use crate::web::auth::AdminPage;
use crate::web::error::PageResult;
use crate::web::forms::{CourseForm, LessonForm, StatusForm};
use crate::web::state::AppState;
use crate::web::templates::*;
use crate::web::views::{level_options, stat_cards, CourseCard, LessonItem, RegistrationRow, SelectOption};

fn lessons_path(course_id: i64) -> String {
    format!("/admin/courses/{course_id}/lessons")
}

/// Path ids arrive as text so a malformed id renders a 400 page instead of axum's plain rejection.
fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| AcademyError::validation(format!("Invalid {what} id")))
}

pub async fn dashboard(_: AdminPage, State(state): State<AppState>) -> PageResult<Html<String>> {
    let stats = state.catalog.dashboard_stats().await?;
    let page = AdminDashboardTemplate {
        stats: stat_cards(&stats),
        recent: stats
            .recent_courses
            .iter()
            .map(|c| CourseCard::new(c, None, 0))
            .collect(),
    };
    Ok(render(&page)?)
}

pub async fn courses(_: AdminPage, State(state): State<AppState>) -> PageResult<Html<String>> {
    let courses = state.catalog.list_all_courses().await?;
    let page = AdminCoursesTemplate {
        courses: courses.iter().map(CourseCard::from).collect(),
    };
    Ok(render(&page)?)
}

async fn course_form_page(
    state: &AppState,
    heading: &str,
    action: String,
    form: CourseForm,
    error: Option<String>,
) -> PageResult<Html<String>> {
    let categories = state.catalog.list_categories().await?;
    let mut options = vec![SelectOption::new("", "بدون دسته‌بندی", &form.category_id)];
    options.extend(categories.iter().filter_map(|c| {
        c.category
            .id
            .map(|id| SelectOption::new(id.to_string(), c.category.name.clone(), &form.category_id))
    }));

    let page = AdminCourseFormTemplate {
        heading: heading.to_string(),
        action,
        levels: level_options(&form.level, None),
        categories: options,
        form,
        error,
    };
    Ok(render(&page)?)
}

/// Re-renders a form with the message when the catalog rejects the input.
fn form_error(rendered: PageResult<Html<String>>) -> PageResult<Response> {
    Ok((StatusCode::BAD_REQUEST, rendered?).into_response())
}

fn is_input_error(err: &AcademyError) -> bool {
    matches!(err, AcademyError::Validation(_) | AcademyError::Conflict(_))
}

pub async fn new_course(_: AdminPage, State(state): State<AppState>) -> PageResult<Html<String>> {
    let form = CourseForm {
        level: "beginner".to_string(),
        price: "0".to_string(),
        session_count: "0".to_string(),
        ..Default::default()
    };
    course_form_page(&state, "دوره جدید", "/admin/courses/new".to_string(), form, None).await
}

pub async fn create_course(
    _: AdminPage,
    State(state): State<AppState>,
    Form(form): Form<CourseForm>,
) -> PageResult<Response> {
    let result = match form.to_new_course() {
        Ok(input) => state.catalog.create_course(input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/admin/courses").into_response()),
        Err(e) if is_input_error(&e) => {
            let action = "/admin/courses/new".to_string();
            form_error(course_form_page(&state, "دوره جدید", action, form, Some(e.to_string())).await)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_course(
    _: AdminPage,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PageResult<Html<String>> {
    let course_id = parse_id(&id, "course")?;
    let course = state.catalog.get_course(course_id).await?;
    course_form_page(
        &state,
        "ویرایش دوره",
        format!("/admin/courses/{course_id}/edit"),
        CourseForm::from_course(&course),
        None,
    )
    .await
}

pub async fn update_course(
    _: AdminPage,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CourseForm>,
) -> PageResult<Response> {
    let course_id = parse_id(&id, "course")?;
    let result = match form.to_patch(course_id) {
        Ok(patch) => state.catalog.update_course(patch).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/admin/courses").into_response()),
        Err(e) if is_input_error(&e) => {
            let action = format!("/admin/courses/{course_id}/edit");
            form_error(course_form_page(&state, "ویرایش دوره", action, form, Some(e.to_string())).await)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_course(
    _: AdminPage,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PageResult<Redirect> {
    let course_id = parse_id(&id, "course")?;
    state.catalog.delete_course(course_id).await?;
    Ok(Redirect::to("/admin/courses"))
}

// Lessons

pub async fn lessons(
    _: AdminPage,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PageResult<Html<String>> {
    let course_id = parse_id(&id, "course")?;
    let course = state.catalog.get_course(course_id).await?;
    let lessons = state.catalog.list_lessons(course_id).await?;

    let page = AdminLessonsTemplate {
        course: CourseCard::new(&course, None, lessons.len()),
        lessons: LessonItem::list(&course.slug, &lessons),
    };
    Ok(render(&page)?)
}

fn lesson_form_page(
    course: &Course,
    heading: &str,
    action: String,
    form: LessonForm,
    error: Option<String>,
) -> PageResult<Html<String>> {
    let page = AdminLessonFormTemplate {
        heading: heading.to_string(),
        action,
        course_id: course.id.unwrap_or_default(),
        course_title: course.title.clone(),
        form,
        error,
    };
    Ok(render(&page)?)
}

pub async fn new_lesson(
    _: AdminPage,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> PageResult<Html<String>> {
    let course_id = parse_id(&id, "course")?;
    let course = state.catalog.get_course(course_id).await?;
    let form = LessonForm {
        order_index: state.catalog.next_order_index(course_id).await?.to_string(),
        duration_minutes: "0".to_string(),
        ..Default::default()
    };
    lesson_form_page(&course, "درس جدید", format!("{}/new", lessons_path(course_id)), form, None)
}

pub async fn create_lesson(
    _: AdminPage,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<LessonForm>,
) -> PageResult<Response> {
    let course_id = parse_id(&id, "course")?;
    let course = state.catalog.get_course(course_id).await?;
    let result = match form.to_new_lesson(course_id) {
        Ok(input) => state.catalog.create_lesson(input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to(&lessons_path(course_id)).into_response()),
        Err(e) if is_input_error(&e) => {
            let action = format!("{}/new", lessons_path(course_id));
            form_error(lesson_form_page(&course, "درس جدید", action, form, Some(e.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}

/// Loads the lesson and checks it belongs to the course in the path.
async fn lesson_in_course(state: &AppState, course_id: i64, lesson_id: i64) -> Result<crate::domain::Lesson> {
    let lesson = state.catalog.get_lesson(lesson_id).await?;
    if lesson.course_id != course_id {
        return Err(AcademyError::not_found("Lesson"));
    }
    Ok(lesson)
}

pub async fn edit_lesson(
    _: AdminPage,
    State(state): State<AppState>,
    Path((id, lesson_id)): Path<(String, String)>,
) -> PageResult<Html<String>> {
    let course_id = parse_id(&id, "course")?;
    let lesson_id = parse_id(&lesson_id, "lesson")?;
    let course = state.catalog.get_course(course_id).await?;
    let lesson = lesson_in_course(&state, course_id, lesson_id).await?;

    lesson_form_page(
        &course,
        "ویرایش درس",
        format!("{}/{lesson_id}/edit", lessons_path(course_id)),
        LessonForm::from_lesson(&lesson),
        None,
    )
}

pub async fn update_lesson(
    _: AdminPage,
    State(state): State<AppState>,
    Path((id, lesson_id)): Path<(String, String)>,
    Form(form): Form<LessonForm>,
) -> PageResult<Response> {
    let course_id = parse_id(&id, "course")?;
    let lesson_id = parse_id(&lesson_id, "lesson")?;
    let course = state.catalog.get_course(course_id).await?;
    lesson_in_course(&state, course_id, lesson_id).await?;

    let result = match form.to_patch(lesson_id) {
        Ok(patch) => state.catalog.update_lesson(patch).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to(&lessons_path(course_id)).into_response()),
        Err(e) if is_input_error(&e) => {
            let action = format!("{}/{lesson_id}/edit", lessons_path(course_id));
            form_error(lesson_form_page(&course, "ویرایش درس", action, form, Some(e.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_lesson(
    _: AdminPage,
    State(state): State<AppState>,
    Path((id, lesson_id)): Path<(String, String)>,
) -> PageResult<Redirect> {
    let course_id = parse_id(&id, "course")?;
    let lesson_id = parse_id(&lesson_id, "lesson")?;
    lesson_in_course(&state, course_id, lesson_id).await?;
    state.catalog.delete_lesson(lesson_id).await?;
    Ok(Redirect::to(&lessons_path(course_id)))
}

// Registrations

pub async fn registrations(_: AdminPage, State(state): State<AppState>) -> PageResult<Html<String>> {
    let registrations = state.catalog.list_registrations().await?;
    let page = AdminRegistrationsTemplate {
        registrations: registrations.iter().map(RegistrationRow::from).collect(),
    };
    Ok(render(&page)?)
}

pub async fn update_registration_status(
    _: AdminPage,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> PageResult<Redirect> {
    let registration_id = parse_id(&id, "registration")?;
    let status: RegistrationStatus = form
        .status
        .parse()
        .map_err(|e: crate::domain::ParseEnumError| AcademyError::validation(e.to_string()))?;
    state
        .catalog
        .update_registration_status(registration_id, status)
        .await?;
    Ok(Redirect::to("/admin/registrations"))
}
