use askama::Template;
use axum::response::Html;

use crate::web::forms::{CourseForm, EnrollForm, LessonForm};
use crate::web::views::{
    CategoryLink, CourseCard, InstructorView, LessonItem, LessonLink, RegistrationRow, SelectOption, StatCard,
};

pub fn render<T: Template>(template: &T) -> Result<Html<String>, askama::Error> {
    template.render().map(Html)
}

// Storefront

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub courses: Vec<CourseCard>,
    pub categories: Vec<CategoryLink>,
}

#[derive(Template)]
#[template(path = "courses.html")]
pub struct CoursesTemplate {
    pub courses: Vec<CourseCard>,
    pub categories: Vec<SelectOption>,
    pub levels: Vec<SelectOption>,
    pub search: String,
}

#[derive(Template)]
#[template(path = "course_detail.html")]
pub struct CourseDetailTemplate {
    pub course: CourseCard,
    pub teaser_url: Option<String>,
    pub what_you_learn: Vec<String>,
    pub prerequisites: Vec<String>,
    pub lessons: Vec<LessonItem>,
    pub instructor: Option<InstructorView>,
    pub form: EnrollForm,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "enroll_success.html")]
pub struct EnrollSuccessTemplate {
    pub full_name: String,
    pub course_title: String,
    pub course_slug: String,
}

#[derive(Template)]
#[template(path = "lesson.html")]
pub struct LessonTemplate {
    pub course_title: String,
    pub course_slug: String,
    pub lesson: LessonItem,
    /// Only set for free lessons.
    pub video_url: Option<String>,
    pub lessons: Vec<LessonItem>,
    pub previous: Option<LessonLink>,
    pub next: Option<LessonLink>,
    pub progress: String,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate;

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub code: u16,
    pub message: String,
}

// Back office

#[derive(Template, Default)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub stats: Vec<StatCard>,
    pub recent: Vec<CourseCard>,
}

#[derive(Template)]
#[template(path = "admin/courses.html")]
pub struct AdminCoursesTemplate {
    pub courses: Vec<CourseCard>,
}

#[derive(Template)]
#[template(path = "admin/course_form.html")]
pub struct AdminCourseFormTemplate {
    pub heading: String,
    pub action: String,
    pub form: CourseForm,
    pub categories: Vec<SelectOption>,
    pub levels: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/lessons.html")]
pub struct AdminLessonsTemplate {
    pub course: CourseCard,
    pub lessons: Vec<LessonItem>,
}

#[derive(Template)]
#[template(path = "admin/lesson_form.html")]
pub struct AdminLessonFormTemplate {
    pub heading: String,
    pub action: String,
    pub course_id: i64,
    pub course_title: String,
    pub form: LessonForm,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/registrations.html")]
pub struct AdminRegistrationsTemplate {
    pub registrations: Vec<RegistrationRow>,
}
