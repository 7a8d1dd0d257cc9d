use super::traits::{sort_lessons, Storage};
use crate::domain::*;
use crate::error::{AcademyError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Tables {
    categories: BTreeMap<i64, Category>,
    users: BTreeMap<i64, User>,
    courses: BTreeMap<i64, Course>,
    lessons: BTreeMap<i64, Lesson>,
    registrations: BTreeMap<i64, Registration>,
    last_id: i64,
}

impl Tables {
    // One sequence for every table keeps ids unique across the store, which is
    // all the catalog relies on.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    // The checks below run under the write lock and mirror the UNIQUE and
    // FOREIGN KEY constraints of the SQL schema.

    fn check_category_slug(&self, slug: &str) -> Result<()> {
        if self.categories.values().any(|c| c.slug == slug) {
            return Err(AcademyError::conflict(format!(
                "A category with slug '{slug}' already exists"
            )));
        }
        Ok(())
    }

    fn check_course_slug(&self, slug: &str, except: Option<i64>) -> Result<()> {
        if self.courses.values().any(|c| c.slug == slug && c.id != except) {
            return Err(AcademyError::conflict(format!(
                "A course with slug '{slug}' already exists"
            )));
        }
        Ok(())
    }

    fn check_lesson_slug(&self, course_id: i64, slug: &str, except: Option<i64>) -> Result<()> {
        let taken = self
            .lessons
            .values()
            .any(|l| l.course_id == course_id && l.slug == slug && l.id != except);
        if taken {
            return Err(AcademyError::conflict(format!(
                "A lesson with slug '{slug}' already exists in this course"
            )));
        }
        Ok(())
    }
}

/// In-memory storage implementation for development/testing
#[derive(Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_id(id: Option<i64>, what: &str) -> Result<i64> {
    id.ok_or_else(|| AcademyError::validation(format!("Cannot update {what} without ID")))
}

fn newest_first<T, F>(rows: &mut [T], key: F)
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, i64),
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_category(&self, category: &mut Category) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_category_slug(&category.slug)?;
        let id = tables.next_id();
        category.id = Some(id);
        tables.categories.insert(id, category.clone());

        debug!("Created category: {} with id {}", category.slug, id);
        Ok(())
    }

    async fn get_category_by_id(&self, category_id: i64) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.get(&category_id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn create_user(&self, user: &mut User) -> Result<()> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        user.id = Some(id);
        tables.users.insert(id, user.clone());

        debug!("Created user: {} with id {}", user.email, id);
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn create_course(&self, course: &mut Course) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_course_slug(&course.slug, None)?;
        let id = tables.next_id();
        course.id = Some(id);
        tables.courses.insert(id, course.clone());

        debug!("Created course: {} with id {}", course.slug, id);
        Ok(())
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let course_id = require_id(course.id, "course")?;
        let mut tables = self.tables.write().await;
        tables.check_course_slug(&course.slug, Some(course_id))?;
        match tables.courses.get_mut(&course_id) {
            Some(existing) => *existing = course.clone(),
            None => return Err(AcademyError::not_found("Course")),
        }

        debug!("Updated course: {} with id {}", course.slug, course_id);
        Ok(())
    }

    async fn delete_course(&self, course_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let registrations = tables
            .registrations
            .values()
            .filter(|r| r.course_id == course_id)
            .count();
        if registrations > 0 {
            return Err(AcademyError::conflict(format!(
                "Course {course_id} has {registrations} registrations and cannot be deleted"
            )));
        }
        let removed = tables.courses.remove(&course_id).is_some();
        if removed {
            tables.lessons.retain(|_, l| l.course_id != course_id);
            debug!("Deleted course {} and its lessons", course_id);
        }
        Ok(removed)
    }

    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>> {
        let tables = self.tables.read().await;
        Ok(tables.courses.get(&course_id).cloned())
    }

    async fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>> {
        let tables = self.tables.read().await;
        Ok(tables.courses.values().find(|c| c.slug == slug).cloned())
    }

    async fn get_all_courses(&self) -> Result<Vec<Course>> {
        let tables = self.tables.read().await;
        let mut courses: Vec<Course> = tables.courses.values().cloned().collect();
        newest_first(&mut courses, |c| (c.created_at, c.id.unwrap_or_default()));
        Ok(courses)
    }

    async fn create_lesson(&self, lesson: &mut Lesson) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.courses.contains_key(&lesson.course_id) {
            return Err(AcademyError::not_found("Course"));
        }
        tables.check_lesson_slug(lesson.course_id, &lesson.slug, None)?;
        let id = tables.next_id();
        lesson.id = Some(id);
        tables.lessons.insert(id, lesson.clone());

        debug!("Created lesson: {} with id {}", lesson.slug, id);
        Ok(())
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<()> {
        let lesson_id = require_id(lesson.id, "lesson")?;
        let mut tables = self.tables.write().await;
        tables.check_lesson_slug(lesson.course_id, &lesson.slug, Some(lesson_id))?;
        match tables.lessons.get_mut(&lesson_id) {
            Some(existing) => *existing = lesson.clone(),
            None => return Err(AcademyError::not_found("Lesson")),
        }

        debug!("Updated lesson: {} with id {}", lesson.slug, lesson_id);
        Ok(())
    }

    async fn delete_lesson(&self, lesson_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.lessons.remove(&lesson_id).is_some())
    }

    async fn get_lesson_by_id(&self, lesson_id: i64) -> Result<Option<Lesson>> {
        let tables = self.tables.read().await;
        Ok(tables.lessons.get(&lesson_id).cloned())
    }

    async fn get_lessons_by_course_id(&self, course_id: i64) -> Result<Vec<Lesson>> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        sort_lessons(&mut lessons);
        Ok(lessons)
    }

    async fn count_lessons_by_course_id(&self, course_id: i64) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables.lessons.values().filter(|l| l.course_id == course_id).count())
    }

    async fn count_lessons(&self) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables.lessons.len())
    }

    async fn create_registration(&self, registration: &mut Registration) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.courses.contains_key(&registration.course_id) {
            return Err(AcademyError::not_found("Course"));
        }
        let id = tables.next_id();
        registration.id = Some(id);
        tables.registrations.insert(id, registration.clone());

        debug!("Created registration {} for course {}", id, registration.course_id);
        Ok(())
    }

    async fn update_registration(&self, registration: &Registration) -> Result<()> {
        let registration_id = require_id(registration.id, "registration")?;
        let mut tables = self.tables.write().await;
        match tables.registrations.get_mut(&registration_id) {
            Some(existing) => *existing = registration.clone(),
            None => return Err(AcademyError::not_found("Registration")),
        }
        Ok(())
    }

    async fn get_registration_by_id(&self, registration_id: i64) -> Result<Option<Registration>> {
        let tables = self.tables.read().await;
        Ok(tables.registrations.get(&registration_id).cloned())
    }

    async fn get_all_registrations(&self) -> Result<Vec<Registration>> {
        let tables = self.tables.read().await;
        let mut registrations: Vec<Registration> = tables.registrations.values().cloned().collect();
        newest_first(&mut registrations, |r| (r.created_at, r.id.unwrap_or_default()));
        Ok(registrations)
    }

    async fn count_registrations_by_course_id(&self, course_id: i64) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .values()
            .filter(|r| r.course_id == course_id)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn course(slug: &str, minutes_ago: i64) -> Course {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Course {
            id: None,
            title: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            thumbnail_url: None,
            teaser_url: None,
            location: None,
            instructor_name: None,
            price: 0,
            level: CourseLevel::Beginner,
            session_count: 0,
            coming_soon: false,
            what_you_learn: vec![],
            prerequisites: vec![],
            category_id: None,
            instructor_id: None,
            published: true,
            created_at: at,
            updated_at: at,
        }
    }

    fn lesson(course_id: i64, slug: &str, order_index: i64) -> Lesson {
        let now = Utc::now();
        Lesson {
            id: None,
            course_id,
            title: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            video_url: None,
            duration_minutes: 10,
            order_index,
            is_free: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn courses_come_back_newest_first() {
        let storage = InMemoryStorage::new();
        storage.create_course(&mut course("old", 30)).await.unwrap();
        storage.create_course(&mut course("new", 1)).await.unwrap();
        storage.create_course(&mut course("middle", 10)).await.unwrap();

        let slugs: Vec<String> = storage
            .get_all_courses()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec!["new", "middle", "old"]);
    }

    #[tokio::test]
    async fn lessons_are_ordered_and_cascade_with_course() {
        let storage = InMemoryStorage::new();
        let mut c = course("revit", 0);
        storage.create_course(&mut c).await.unwrap();
        let course_id = c.id.unwrap();

        storage.create_lesson(&mut lesson(course_id, "third", 3)).await.unwrap();
        storage.create_lesson(&mut lesson(course_id, "first", 1)).await.unwrap();
        storage.create_lesson(&mut lesson(course_id, "second", 2)).await.unwrap();

        let order: Vec<String> = storage
            .get_lessons_by_course_id(course_id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.slug)
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);

        assert!(storage.delete_course(course_id).await.unwrap());
        assert_eq!(storage.count_lessons().await.unwrap(), 0);
        assert!(!storage.delete_course(course_id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_slugs_are_conflicts() {
        let storage = InMemoryStorage::new();
        let mut first = course("revit", 0);
        storage.create_course(&mut first).await.unwrap();
        let course_id = first.id.unwrap();

        let err = storage.create_course(&mut course("revit", 0)).await.unwrap_err();
        assert!(matches!(err, AcademyError::Conflict(_)));

        let mut other = course("lumion", 0);
        storage.create_course(&mut other).await.unwrap();
        other.slug = "revit".to_string();
        let err = storage.update_course(&other).await.unwrap_err();
        assert!(matches!(err, AcademyError::Conflict(_)));

        storage.create_lesson(&mut lesson(course_id, "intro", 1)).await.unwrap();
        let err = storage.create_lesson(&mut lesson(course_id, "intro", 2)).await.unwrap_err();
        assert!(matches!(err, AcademyError::Conflict(_)));
        // Same lesson slug in another course is fine
        storage
            .create_lesson(&mut lesson(other.id.unwrap(), "intro", 1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn course_with_registrations_is_not_deleted() {
        let storage = InMemoryStorage::new();
        let mut c = course("revit", 0);
        storage.create_course(&mut c).await.unwrap();
        let course_id = c.id.unwrap();

        let now = Utc::now();
        let mut registration = Registration {
            id: None,
            course_id,
            full_name: "Sara".to_string(),
            email: "sara@example.com".to_string(),
            phone: "09121234567".to_string(),
            message: None,
            status: RegistrationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        storage.create_registration(&mut registration).await.unwrap();

        let err = storage.delete_course(course_id).await.unwrap_err();
        assert!(matches!(err, AcademyError::Conflict(_)));
        assert!(storage.get_course_by_id(course_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn lesson_requires_existing_course() {
        let storage = InMemoryStorage::new();
        let err = storage.create_lesson(&mut lesson(42, "orphan", 1)).await.unwrap_err();
        assert!(matches!(err, AcademyError::NotFound(_)));
    }
}
