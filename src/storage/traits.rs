use crate::domain::*;
use crate::error::Result;
use async_trait::async_trait;

/// Storage trait for persisting the catalog (categories, users, courses, lessons, registrations)
///
/// Implementations assign ids on create and keep referential integrity the
/// way a relational store would: deleting a course removes its lessons.
/// Uniqueness and existence checks with user-facing messages live in the
/// catalog layer.
#[async_trait]
pub trait Storage: Send + Sync {
    // Category operations
    async fn create_category(&self, category: &mut Category) -> Result<()>;
    async fn get_category_by_id(&self, category_id: i64) -> Result<Option<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;
    async fn get_all_categories(&self) -> Result<Vec<Category>>;

    // User operations
    async fn create_user(&self, user: &mut User) -> Result<()>;
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>>;

    // Course operations
    async fn create_course(&self, course: &mut Course) -> Result<()>;
    async fn update_course(&self, course: &Course) -> Result<()>;
    /// Removes the course and its lessons. Returns false when nothing was deleted.
    async fn delete_course(&self, course_id: i64) -> Result<bool>;
    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>>;
    async fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>>;
    /// Every course, newest first.
    async fn get_all_courses(&self) -> Result<Vec<Course>>;

    // Lesson operations
    async fn create_lesson(&self, lesson: &mut Lesson) -> Result<()>;
    async fn update_lesson(&self, lesson: &Lesson) -> Result<()>;
    async fn delete_lesson(&self, lesson_id: i64) -> Result<bool>;
    async fn get_lesson_by_id(&self, lesson_id: i64) -> Result<Option<Lesson>>;
    /// Lessons of a course by `order_index`, ties broken by id.
    async fn get_lessons_by_course_id(&self, course_id: i64) -> Result<Vec<Lesson>>;
    async fn count_lessons_by_course_id(&self, course_id: i64) -> Result<usize>;
    async fn count_lessons(&self) -> Result<usize>;

    // Registration operations
    async fn create_registration(&self, registration: &mut Registration) -> Result<()>;
    async fn update_registration(&self, registration: &Registration) -> Result<()>;
    async fn get_registration_by_id(&self, registration_id: i64) -> Result<Option<Registration>>;
    /// Every registration, newest first.
    async fn get_all_registrations(&self) -> Result<Vec<Registration>>;
    async fn count_registrations_by_course_id(&self, course_id: i64) -> Result<usize>;
}

/// Lesson order used by every backend.
pub fn sort_lessons(lessons: &mut [Lesson]) {
    lessons.sort_by_key(|l| (l.order_index, l.id.unwrap_or(i64::MAX)));
}
