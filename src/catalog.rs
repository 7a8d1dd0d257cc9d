//! Course catalog operations shared by the pages, the JSON API and the CLI.
//!
//! Everything here works against [`Storage`] and adds the rules a relational
//! store alone would not give us: slug derivation and uniqueness, existence
//! checks with readable messages, lesson ordering and input validation.

use crate::constants::{ALL_CATEGORIES, COURSES_DIR, FEATURED_COURSES, RECENT_COURSES};
use crate::domain::*;
use crate::error::{AcademyError, Result};
use crate::slug::slugify;
use crate::storage::Storage;
use crate::upload::media_url;
use crate::validation::{self, present, require};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Catalog {
    storage: Arc<dyn Storage>,
    upload_root: PathBuf,
}

/// Uses the explicit slug when one was given, the title otherwise.
fn resolve_slug(explicit: Option<&str>, title: &str) -> Result<String> {
    let slug = match present(explicit) {
        Some(s) => slugify(s),
        None => slugify(title),
    };
    if slug.is_empty() {
        return Err(AcademyError::validation("slug is required"));
    }
    Ok(slug)
}

fn trimmed(value: Option<String>) -> Option<String> {
    present(value.as_deref()).map(str::to_string)
}

fn matches_search(course: &Course, needle: &str) -> bool {
    course.title.to_lowercase().contains(needle)
        || course
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

impl Catalog {
    pub fn new(storage: Arc<dyn Storage>, upload_root: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            upload_root: upload_root.into(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    async fn require_course(&self, course_id: i64) -> Result<Course> {
        self.storage
            .get_course_by_id(course_id)
            .await?
            .ok_or_else(|| AcademyError::not_found("Course"))
    }

    async fn require_lesson(&self, lesson_id: i64) -> Result<Lesson> {
        self.storage
            .get_lesson_by_id(lesson_id)
            .await?
            .ok_or_else(|| AcademyError::not_found("Lesson"))
    }

    async fn ensure_course_slug_free(&self, slug: &str, except: Option<i64>) -> Result<()> {
        if let Some(existing) = self.storage.get_course_by_slug(slug).await? {
            if existing.id != except {
                return Err(AcademyError::conflict(format!(
                    "A course with slug '{slug}' already exists"
                )));
            }
        }
        Ok(())
    }

    async fn ensure_lesson_slug_free(&self, course_id: i64, slug: &str, except: Option<i64>) -> Result<()> {
        let lessons = self.storage.get_lessons_by_course_id(course_id).await?;
        if lessons.iter().any(|l| l.slug == slug && l.id != except) {
            return Err(AcademyError::conflict(format!(
                "A lesson with slug '{slug}' already exists in this course"
            )));
        }
        Ok(())
    }

    async fn check_references(&self, category_id: Option<i64>, instructor_id: Option<i64>) -> Result<()> {
        if let Some(id) = category_id {
            if self.storage.get_category_by_id(id).await?.is_none() {
                return Err(AcademyError::not_found("Category"));
            }
        }
        if let Some(id) = instructor_id {
            if self.storage.get_user_by_id(id).await?.is_none() {
                return Err(AcademyError::not_found("Instructor"));
            }
        }
        Ok(())
    }

    async fn category_of(&self, course: &Course) -> Result<Option<Category>> {
        match course.category_id {
            Some(id) => self.storage.get_category_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn summarize(&self, course: Course) -> Result<CourseSummary> {
        let category = self.category_of(&course).await?;
        let lesson_count = match course.id {
            Some(id) => self.storage.count_lessons_by_course_id(id).await?,
            None => 0,
        };
        Ok(CourseSummary {
            course,
            category,
            lesson_count,
        })
    }

    // Public catalog

    /// Published courses, newest first, narrowed by the filter.
    pub async fn list_published_courses(&self, filter: &CourseFilter) -> Result<Vec<CourseSummary>> {
        let category_id = match present(filter.category.as_deref()) {
            None | Some(ALL_CATEGORIES) => None,
            Some(slug) => match self.storage.get_category_by_slug(slug).await? {
                Some(category) => category.id,
                // Unknown category matches nothing
                None => return Ok(Vec::new()),
            },
        };
        let level = match present(filter.level.as_deref()) {
            Some(raw) => Some(
                raw.parse::<CourseLevel>()
                    .map_err(|e| AcademyError::validation(e.to_string()))?,
            ),
            None => None,
        };
        let search = present(filter.search.as_deref()).map(str::to_lowercase);

        let mut summaries = Vec::new();
        for course in self.storage.get_all_courses().await? {
            if !course.published
                || category_id.is_some_and(|id| course.category_id != Some(id))
                || level.is_some_and(|l| course.level != l)
                || search.as_deref().is_some_and(|s| !matches_search(&course, s))
            {
                continue;
            }
            summaries.push(self.summarize(course).await?);
        }

        debug!("Listed {} published courses", summaries.len());
        Ok(summaries)
    }

    pub async fn featured_courses(&self, limit: usize) -> Result<Vec<CourseSummary>> {
        let mut courses = self.list_published_courses(&CourseFilter::default()).await?;
        courses.truncate(limit);
        Ok(courses)
    }

    /// Home page selection.
    pub async fn home_courses(&self) -> Result<Vec<CourseSummary>> {
        self.featured_courses(FEATURED_COURSES).await
    }

    /// Course page data. Unpublished courses are still reachable by slug.
    pub async fn course_detail(&self, slug: &str) -> Result<CourseDetail> {
        let course = self
            .storage
            .get_course_by_slug(slug)
            .await?
            .ok_or_else(|| AcademyError::not_found("Course"))?;
        let course_id = course.id.ok_or_else(|| AcademyError::not_found("Course"))?;

        let category = self.category_of(&course).await?;
        let instructor = match course.instructor_id {
            Some(id) => self.storage.get_user_by_id(id).await?,
            None => None,
        };
        let lessons = self.storage.get_lessons_by_course_id(course_id).await?;

        Ok(CourseDetail {
            lesson_count: lessons.len(),
            course,
            category,
            instructor,
            lessons,
        })
    }

    pub async fn lesson_view(&self, course_slug: &str, lesson_slug: &str) -> Result<LessonView> {
        let detail = self.course_detail(course_slug).await?;
        let position = detail
            .lessons
            .iter()
            .position(|l| l.slug == lesson_slug)
            .ok_or_else(|| AcademyError::not_found("Lesson"))?;

        let lessons = detail.lessons;
        let previous = position.checked_sub(1).and_then(|i| lessons.get(i)).cloned();
        let next = lessons.get(position + 1).cloned();

        Ok(LessonView {
            course: detail.course,
            lesson: lessons[position].clone(),
            lessons,
            position,
            previous,
            next,
        })
    }

    /// Every category with the number of courses filed under it.
    pub async fn list_categories(&self) -> Result<Vec<CategoryWithCount>> {
        let courses = self.storage.get_all_courses().await?;
        let categories = self.storage.get_all_categories().await?;
        Ok(categories
            .into_iter()
            .map(|category| {
                let course_count = courses
                    .iter()
                    .filter(|c| c.category_id.is_some() && c.category_id == category.id)
                    .count();
                CategoryWithCount {
                    category,
                    course_count,
                }
            })
            .collect())
    }

    pub async fn create_category(&self, name: &str, slug: Option<&str>, description: Option<String>) -> Result<Category> {
        let name = require(Some(name), "name")?;
        let slug = resolve_slug(slug, name)?;
        if self.storage.get_category_by_slug(&slug).await?.is_some() {
            return Err(AcademyError::conflict(format!(
                "A category with slug '{slug}' already exists"
            )));
        }

        let mut category = Category {
            id: None,
            name: name.to_string(),
            slug,
            description: trimmed(description),
            created_at: Utc::now(),
        };
        self.storage.create_category(&mut category).await?;
        Ok(category)
    }

    // Course administration

    /// Every course regardless of publication, newest first.
    pub async fn list_all_courses(&self) -> Result<Vec<CourseSummary>> {
        let mut summaries = Vec::new();
        for course in self.storage.get_all_courses().await? {
            summaries.push(self.summarize(course).await?);
        }
        Ok(summaries)
    }

    pub async fn get_course(&self, course_id: i64) -> Result<Course> {
        self.require_course(course_id).await
    }

    /// Creates a course with defaults applied and prepares its media directory.
    pub async fn create_course(&self, input: NewCourse) -> Result<Course> {
        let title = require(Some(&input.title), "title")?.to_string();
        let slug = resolve_slug(input.slug.as_deref(), &title)?;
        let price = validation::non_negative(input.price.unwrap_or(0), "price")?;
        let session_count = validation::non_negative(input.session_count.unwrap_or(0), "session_count")?;

        self.ensure_course_slug_free(&slug, None).await?;
        self.check_references(input.category_id, input.instructor_id).await?;

        let media_dir = self.upload_root.join(COURSES_DIR).join(&slug);
        tokio::fs::create_dir_all(&media_dir).await?;

        let now = Utc::now();
        let mut course = Course {
            id: None,
            title,
            slug,
            description: trimmed(input.description),
            thumbnail_url: trimmed(input.thumbnail_url),
            teaser_url: trimmed(input.teaser_url),
            location: trimmed(input.location),
            instructor_name: trimmed(input.instructor_name),
            price,
            level: input.level.unwrap_or_default(),
            session_count,
            coming_soon: input.coming_soon.unwrap_or(false),
            what_you_learn: input.what_you_learn,
            prerequisites: input.prerequisites,
            category_id: input.category_id,
            instructor_id: input.instructor_id,
            published: input.published.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        self.storage.create_course(&mut course).await?;

        info!(slug = %course.slug, id = ?course.id, "Created course");
        Ok(course)
    }

    /// Applies the fields present in the patch and refreshes `updated_at`.
    pub async fn update_course(&self, patch: CoursePatch) -> Result<Course> {
        let course_id = patch
            .id
            .ok_or_else(|| AcademyError::validation("id is required"))?;
        let mut course = self.require_course(course_id).await?;
        let previous_slug = course.slug.clone();

        if let Some(title) = patch.title {
            course.title = require(Some(&title), "title")?.to_string();
        }
        if let Some(slug) = patch.slug {
            let slug = resolve_slug(Some(&slug), "")?;
            self.ensure_course_slug_free(&slug, Some(course_id)).await?;
            course.slug = slug;
        }
        if let Some(description) = patch.description {
            course.description = trimmed(description);
        }
        if let Some(thumbnail_url) = patch.thumbnail_url {
            course.thumbnail_url = trimmed(thumbnail_url);
        }
        if let Some(teaser_url) = patch.teaser_url {
            course.teaser_url = trimmed(teaser_url);
        }
        if let Some(location) = patch.location {
            course.location = trimmed(location);
        }
        if let Some(instructor_name) = patch.instructor_name {
            course.instructor_name = trimmed(instructor_name);
        }
        if let Some(price) = patch.price {
            course.price = validation::non_negative(price, "price")?;
        }
        if let Some(level) = patch.level {
            course.level = level;
        }
        if let Some(session_count) = patch.session_count {
            course.session_count = validation::non_negative(session_count, "session_count")?;
        }
        if let Some(coming_soon) = patch.coming_soon {
            course.coming_soon = coming_soon;
        }
        if let Some(what_you_learn) = patch.what_you_learn {
            course.what_you_learn = what_you_learn;
        }
        if let Some(prerequisites) = patch.prerequisites {
            course.prerequisites = prerequisites;
        }
        if let Some(category_id) = patch.category_id {
            self.check_references(category_id, None).await?;
            course.category_id = category_id;
        }
        if let Some(instructor_id) = patch.instructor_id {
            self.check_references(None, instructor_id).await?;
            course.instructor_id = instructor_id;
        }
        if let Some(published) = patch.published {
            course.published = published;
        }
        course.updated_at = Utc::now();

        self.storage.update_course(&course).await?;
        if course.slug != previous_slug && self.move_media_dir(&previous_slug, &course.slug).await? {
            self.rebase_media_urls(&mut course, &previous_slug).await?;
        }

        info!(slug = %course.slug, id = course_id, "Updated course");
        Ok(course)
    }

    /// Renames `<root>/courses/<from>` to `<root>/courses/<to>`. Returns false
    /// when there was nothing to move or the target already exists, in which
    /// case existing files stay where they are.
    async fn move_media_dir(&self, from: &str, to: &str) -> Result<bool> {
        let courses_dir = self.upload_root.join(COURSES_DIR);
        let source = courses_dir.join(from);
        let target = courses_dir.join(to);

        let source_exists = tokio::fs::try_exists(&source).await?;
        if source_exists && !tokio::fs::try_exists(&target).await? {
            tokio::fs::rename(&source, &target).await?;
            info!(from = %source.display(), to = %target.display(), "Moved course media");
            return Ok(true);
        }

        tokio::fs::create_dir_all(&target).await?;
        if source_exists {
            warn!(from = %source.display(), to = %target.display(), "Target media directory exists, files left under the previous slug");
        }
        Ok(false)
    }

    /// Points stored media URLs of the course and its lessons at the new slug.
    async fn rebase_media_urls(&self, course: &mut Course, previous_slug: &str) -> Result<()> {
        let from = media_url(previous_slug, "");
        let to = media_url(&course.slug, "");
        let rebase = |url: &mut Option<String>| match url {
            Some(u) if u.starts_with(&from) => {
                *u = format!("{to}{}", &u[from.len()..]);
                true
            }
            _ => false,
        };

        if rebase(&mut course.thumbnail_url) | rebase(&mut course.teaser_url) {
            self.storage.update_course(course).await?;
        }

        let course_id = course.id.ok_or_else(|| AcademyError::not_found("Course"))?;
        for mut lesson in self.storage.get_lessons_by_course_id(course_id).await? {
            if rebase(&mut lesson.video_url) {
                self.storage.update_lesson(&lesson).await?;
            }
        }
        Ok(())
    }

    /// Deletes a course and its lessons. Courses with registrations are kept.
    pub async fn delete_course(&self, course_id: i64) -> Result<()> {
        let course = self.require_course(course_id).await?;
        let registrations = self.storage.count_registrations_by_course_id(course_id).await?;
        if registrations > 0 {
            return Err(AcademyError::conflict(format!(
                "Course '{}' has {registrations} registrations and cannot be deleted",
                course.slug
            )));
        }

        if !self.storage.delete_course(course_id).await? {
            return Err(AcademyError::not_found("Course"));
        }
        info!(slug = %course.slug, id = course_id, "Deleted course");
        Ok(())
    }

    // Lessons

    pub async fn list_lessons(&self, course_id: i64) -> Result<Vec<Lesson>> {
        self.require_course(course_id).await?;
        self.storage.get_lessons_by_course_id(course_id).await
    }

    pub async fn get_lesson(&self, lesson_id: i64) -> Result<Lesson> {
        self.require_lesson(lesson_id).await
    }

    /// One past the highest `order_index` in the course, or 1 for an empty course.
    pub async fn next_order_index(&self, course_id: i64) -> Result<i64> {
        let lessons = self.storage.get_lessons_by_course_id(course_id).await?;
        Ok(lessons.iter().map(|l| l.order_index).max().map_or(1, |max| max + 1))
    }

    pub async fn create_lesson(&self, input: NewLesson) -> Result<Lesson> {
        let course_id = input
            .course_id
            .ok_or_else(|| AcademyError::validation("course_id is required"))?;
        let title = require(Some(&input.title), "title")?.to_string();
        let slug = resolve_slug(input.slug.as_deref(), &title)?;
        let duration_minutes = validation::non_negative(input.duration_minutes.unwrap_or(0), "duration_minutes")?;

        self.require_course(course_id).await?;
        self.ensure_lesson_slug_free(course_id, &slug, None).await?;

        let order_index = match input.order_index {
            Some(order) => order,
            None => self.next_order_index(course_id).await?,
        };

        let now = Utc::now();
        let mut lesson = Lesson {
            id: None,
            course_id,
            title,
            slug,
            description: trimmed(input.description),
            video_url: trimmed(input.video_url),
            duration_minutes,
            order_index,
            is_free: input.is_free.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        self.storage.create_lesson(&mut lesson).await?;

        info!(slug = %lesson.slug, course_id, order_index, "Created lesson");
        Ok(lesson)
    }

    pub async fn update_lesson(&self, patch: LessonPatch) -> Result<Lesson> {
        let lesson_id = patch
            .id
            .ok_or_else(|| AcademyError::validation("id is required"))?;
        let mut lesson = self.require_lesson(lesson_id).await?;

        if let Some(title) = patch.title {
            lesson.title = require(Some(&title), "title")?.to_string();
        }
        if let Some(slug) = patch.slug {
            let slug = resolve_slug(Some(&slug), "")?;
            self.ensure_lesson_slug_free(lesson.course_id, &slug, Some(lesson_id)).await?;
            lesson.slug = slug;
        }
        if let Some(description) = patch.description {
            lesson.description = trimmed(description);
        }
        if let Some(video_url) = patch.video_url {
            lesson.video_url = trimmed(video_url);
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            lesson.duration_minutes = validation::non_negative(duration_minutes, "duration_minutes")?;
        }
        if let Some(order_index) = patch.order_index {
            lesson.order_index = order_index;
        }
        if let Some(is_free) = patch.is_free {
            lesson.is_free = is_free;
        }
        lesson.updated_at = Utc::now();

        self.storage.update_lesson(&lesson).await?;
        debug!(slug = %lesson.slug, id = lesson_id, "Updated lesson");
        Ok(lesson)
    }

    pub async fn delete_lesson(&self, lesson_id: i64) -> Result<()> {
        if !self.storage.delete_lesson(lesson_id).await? {
            return Err(AcademyError::not_found("Lesson"));
        }
        info!(id = lesson_id, "Deleted lesson");
        Ok(())
    }

    // Registrations

    /// Records a guest's enrollment request as `pending`.
    pub async fn create_registration(&self, input: NewRegistration) -> Result<Registration> {
        let course_id = input
            .course_id
            .ok_or_else(|| AcademyError::validation("course_id is required"))?;
        let full_name = require(input.full_name.as_deref(), "full_name")?.to_string();
        let email = require(input.email.as_deref(), "email")?.to_string();
        let phone = require(input.phone.as_deref(), "phone")?;

        if !validation::is_valid_email(&email) {
            return Err(AcademyError::validation("email is not valid"));
        }
        if !validation::is_valid_phone(phone) {
            return Err(AcademyError::validation("phone is not a valid mobile number"));
        }
        let phone = validation::normalize_phone(phone);

        self.require_course(course_id).await?;

        let now = Utc::now();
        let mut registration = Registration {
            id: None,
            course_id,
            full_name,
            email,
            phone,
            message: trimmed(input.message),
            status: RegistrationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.storage.create_registration(&mut registration).await?;

        info!(id = ?registration.id, course_id, "New registration");
        Ok(registration)
    }

    /// Every registration, newest first, with the course it targets.
    pub async fn list_registrations(&self) -> Result<Vec<RegistrationWithCourse>> {
        let registrations = self.storage.get_all_registrations().await?;
        let mut results = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let course = self
                .storage
                .get_course_by_id(registration.course_id)
                .await?
                .map(|c| CourseRef {
                    title: c.title,
                    slug: c.slug,
                });
            results.push(RegistrationWithCourse {
                registration,
                course,
            });
        }
        Ok(results)
    }

    /// Moves a registration to any status.
    pub async fn update_registration_status(&self, registration_id: i64, status: RegistrationStatus) -> Result<Registration> {
        let mut registration = self
            .storage
            .get_registration_by_id(registration_id)
            .await?
            .ok_or_else(|| AcademyError::not_found("Registration"))?;

        registration.status = status;
        registration.updated_at = Utc::now();
        self.storage.update_registration(&registration).await?;

        info!(id = registration_id, status = %status, "Registration status changed");
        Ok(registration)
    }

    /// Parses the `{id, status}` body sent by the admin client.
    pub async fn apply_status_update(&self, update: StatusUpdate) -> Result<Registration> {
        let id = update
            .id
            .ok_or_else(|| AcademyError::validation("id is required"))?;
        let status = require(update.status.as_deref(), "status")?
            .parse::<RegistrationStatus>()
            .map_err(|e| AcademyError::validation(e.to_string()))?;
        self.update_registration_status(id, status).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let courses = self.storage.get_all_courses().await?;
        let registrations = self.storage.get_all_registrations().await?;

        Ok(DashboardStats {
            courses_count: courses.len(),
            published_courses_count: courses.iter().filter(|c| c.published).count(),
            lessons_count: self.storage.count_lessons().await?,
            registrations_count: registrations.len(),
            pending_registrations_count: registrations
                .iter()
                .filter(|r| r.status == RegistrationStatus::Pending)
                .count(),
            recent_courses: courses.into_iter().take(RECENT_COURSES).collect(),
        })
    }
}
