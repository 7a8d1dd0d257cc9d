//! Display-ready shapes handed to the templates. All Persian formatting
//! happens here so the templates only print strings.

use crate::domain::*;
use crate::labels::{format_duration, format_number, format_price};

#[derive(Debug, Clone)]
pub struct CourseCard {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    pub price: String,
    pub free: bool,
    pub level: &'static str,
    pub category: Option<String>,
    pub sessions: Option<String>,
    pub lessons: String,
    pub coming_soon: bool,
    pub published: bool,
    pub created: String,
}

impl CourseCard {
    pub fn new(course: &Course, category: Option<&Category>, lesson_count: usize) -> Self {
        Self {
            id: course.id.unwrap_or_default(),
            title: course.title.clone(),
            slug: course.slug.clone(),
            description: course.description.clone().unwrap_or_default(),
            thumbnail_url: course.thumbnail_url.clone(),
            location: course.location.clone(),
            instructor_name: course.instructor_name.clone(),
            price: format_price(course.price),
            free: course.price <= 0,
            level: course.level.label(),
            category: category.map(|c| c.name.clone()),
            sessions: (course.session_count > 0)
                .then(|| format!("{} جلسه", format_number(course.session_count))),
            lessons: format!("{} درس", format_number(lesson_count as i64)),
            coming_soon: course.coming_soon,
            published: course.published,
            created: course.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&CourseSummary> for CourseCard {
    fn from(summary: &CourseSummary) -> Self {
        CourseCard::new(&summary.course, summary.category.as_ref(), summary.lesson_count)
    }
}

#[derive(Debug, Clone)]
pub struct LessonItem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub duration: String,
    pub number: String,
    pub free: bool,
    pub current: bool,
    pub href: String,
}

impl LessonItem {
    pub fn new(course_slug: &str, lesson: &Lesson, position: usize) -> Self {
        Self {
            id: lesson.id.unwrap_or_default(),
            title: lesson.title.clone(),
            slug: lesson.slug.clone(),
            description: lesson.description.clone().unwrap_or_default(),
            duration: format_duration(lesson.duration_minutes),
            number: format_number(position as i64 + 1),
            free: lesson.is_free,
            current: false,
            href: format!("/courses/{}/learn/{}", course_slug, lesson.slug),
        }
    }

    pub fn list(course_slug: &str, lessons: &[Lesson]) -> Vec<Self> {
        lessons
            .iter()
            .enumerate()
            .map(|(i, l)| Self::new(course_slug, l, i))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LessonLink {
    pub title: String,
    pub href: String,
}

impl LessonLink {
    pub fn new(course_slug: &str, lesson: &Lesson) -> Self {
        Self {
            title: lesson.title.clone(),
            href: format!("/courses/{}/learn/{}", course_slug, lesson.slug),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstructorView {
    pub name: String,
    pub bio: String,
}

/// An `<option>` in a select box.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        Self {
            selected: value == current,
            label: label.into(),
            value,
        }
    }
}

pub fn level_options(current: &str, any_label: Option<&str>) -> Vec<SelectOption> {
    let mut options = Vec::new();
    if let Some(label) = any_label {
        options.push(SelectOption::new("", label, current));
    }
    options.extend(
        CourseLevel::ALL
            .iter()
            .map(|l| SelectOption::new(l.as_str(), l.label(), current)),
    );
    options
}

pub fn status_options(current: RegistrationStatus) -> Vec<SelectOption> {
    RegistrationStatus::ALL
        .iter()
        .map(|s| SelectOption::new(s.as_str(), s.label(), current.as_str()))
        .collect()
}

#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub name: String,
    pub slug: String,
    pub count: String,
}

impl From<&CategoryWithCount> for CategoryLink {
    fn from(c: &CategoryWithCount) -> Self {
        Self {
            name: c.category.name.clone(),
            slug: c.category.slug.clone(),
            count: format!("{} دوره", format_number(c.course_count as i64)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationRow {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub course_title: String,
    pub course_slug: Option<String>,
    pub created: String,
    pub statuses: Vec<SelectOption>,
}

impl From<&RegistrationWithCourse> for RegistrationRow {
    fn from(row: &RegistrationWithCourse) -> Self {
        let r = &row.registration;
        Self {
            id: r.id.unwrap_or_default(),
            full_name: r.full_name.clone(),
            email: r.email.clone(),
            phone: r.phone.clone(),
            message: r.message.clone().unwrap_or_default(),
            status: r.status.as_str(),
            status_label: r.status.label(),
            course_title: row
                .course
                .as_ref()
                .map(|c| c.title.clone())
                .unwrap_or_else(|| "دوره حذف شده".to_string()),
            course_slug: row.course.as_ref().map(|c| c.slug.clone()),
            created: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
            statuses: status_options(r.status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

pub fn stat_cards(stats: &DashboardStats) -> Vec<StatCard> {
    [
        ("دوره‌ها", stats.courses_count),
        ("دوره‌های منتشر شده", stats.published_courses_count),
        ("درس‌ها", stats.lessons_count),
        ("ثبت‌نام‌ها", stats.registrations_count),
        ("در انتظار پیگیری", stats.pending_registrations_count),
    ]
    .into_iter()
    .map(|(label, value)| StatCard {
        label,
        value: format_number(value as i64),
    })
    .collect()
}
