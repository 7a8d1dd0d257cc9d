use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use tracing::info;

use crate::constants::ALL_CATEGORIES;
use crate::domain::{CourseDetail, CourseFilter};
use crate::error::AcademyError;
use crate::labels::format_number;
use crate::web::error::{error_page, PageResult};
use crate::web::forms::EnrollForm;
use crate::web::state::AppState;
use crate::web::templates::*;
use crate::web::views::{level_options, CategoryLink, CourseCard, InstructorView, LessonItem, LessonLink, SelectOption};

pub async fn index(State(state): State<AppState>) -> PageResult<Html<String>> {
    let courses = state.catalog.home_courses().await?;
    let categories = state.catalog.list_categories().await?;

    let page = IndexTemplate {
        courses: courses.iter().map(CourseCard::from).collect(),
        categories: categories.iter().map(CategoryLink::from).collect(),
    };
    Ok(render(&page)?)
}

pub async fn courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> PageResult<Html<String>> {
    let courses = state.catalog.list_published_courses(&filter).await?;
    let categories = state.catalog.list_categories().await?;

    let current_category = filter.category.as_deref().unwrap_or(ALL_CATEGORIES);
    let mut category_options = vec![SelectOption::new(ALL_CATEGORIES, "همه دسته‌بندی‌ها", current_category)];
    category_options.extend(
        categories
            .iter()
            .map(|c| SelectOption::new(c.category.slug.clone(), c.category.name.clone(), current_category)),
    );

    let page = CoursesTemplate {
        courses: courses.iter().map(CourseCard::from).collect(),
        categories: category_options,
        levels: level_options(filter.level.as_deref().unwrap_or(""), Some("همه سطوح")),
        search: filter.search.unwrap_or_default(),
    };
    Ok(render(&page)?)
}

fn detail_page(detail: CourseDetail, form: EnrollForm, error: Option<String>) -> CourseDetailTemplate {
    let course = CourseCard::new(&detail.course, detail.category.as_ref(), detail.lesson_count);
    CourseDetailTemplate {
        lessons: LessonItem::list(&course.slug, &detail.lessons),
        teaser_url: detail.course.teaser_url.clone(),
        what_you_learn: detail.course.what_you_learn.clone(),
        prerequisites: detail.course.prerequisites.clone(),
        instructor: detail.instructor.map(|u| InstructorView {
            name: u.name,
            bio: u.bio.unwrap_or_default(),
        }),
        course,
        form,
        error,
    }
}

pub async fn course_detail(State(state): State<AppState>, Path(slug): Path<String>) -> PageResult<Html<String>> {
    let detail = state.catalog.course_detail(&slug).await?;
    Ok(render(&detail_page(detail, EnrollForm::default(), None))?)
}

/// Enrollment form on the course page. Invalid input re-renders the page with the message.
pub async fn enroll(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<EnrollForm>,
) -> PageResult<Response> {
    let detail = state.catalog.course_detail(&slug).await?;

    match state
        .catalog
        .create_registration(form.to_registration(detail.course.id))
        .await
    {
        Ok(registration) => {
            info!(course = %slug, id = ?registration.id, "Enrollment request received");
            let page = EnrollSuccessTemplate {
                full_name: registration.full_name,
                course_title: detail.course.title,
                course_slug: detail.course.slug,
            };
            Ok(render(&page)?.into_response())
        }
        Err(AcademyError::Validation(message)) => {
            let page = detail_page(detail, form, Some(message));
            Ok((StatusCode::BAD_REQUEST, render(&page)?).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn lesson(
    State(state): State<AppState>,
    Path((course_slug, lesson_slug)): Path<(String, String)>,
) -> PageResult<Html<String>> {
    let view = state.catalog.lesson_view(&course_slug, &lesson_slug).await?;

    let mut lessons = LessonItem::list(&view.course.slug, &view.lessons);
    if let Some(item) = lessons.get_mut(view.position) {
        item.current = true;
    }
    let lesson = LessonItem::new(&view.course.slug, &view.lesson, view.position);

    let page = LessonTemplate {
        video_url: view.lesson.video_url.clone().filter(|_| view.lesson.is_free),
        progress: format!(
            "درس {} از {}",
            format_number(view.position as i64 + 1),
            format_number(view.lessons.len() as i64)
        ),
        previous: view.previous.as_ref().map(|l| LessonLink::new(&view.course.slug, l)),
        next: view.next.as_ref().map(|l| LessonLink::new(&view.course.slug, l)),
        course_title: view.course.title,
        course_slug: view.course.slug,
        lesson,
        lessons,
    };
    Ok(render(&page)?)
}

pub async fn about() -> PageResult<Html<String>> {
    Ok(render(&AboutTemplate)?)
}

pub async fn contact() -> PageResult<Html<String>> {
    Ok(render(&ContactTemplate)?)
}

pub async fn not_found() -> Response {
    error_page(StatusCode::NOT_FOUND, "Page not found".to_string())
}
