//! HTML form bodies posted by the storefront and the back office.

use crate::domain::*;
use crate::error::{AcademyError, Result};
use crate::labels::ascii_digits;
use crate::validation::present;
use serde::Deserialize;

/// Reads an optional whole number, accepting Persian and Arabic-Indic digits.
fn number(raw: &str, field: &str) -> Result<Option<i64>> {
    let ascii: String = ascii_digits(raw.trim())
        .chars()
        .filter(|c| !matches!(c, '٬' | ','))
        .collect();
    if ascii.is_empty() {
        return Ok(None);
    }
    ascii
        .parse()
        .map(Some)
        .map_err(|_| AcademyError::validation(format!("{field} must be a number")))
}

fn optional(raw: &str) -> Option<String> {
    present(Some(raw)).map(str::to_string)
}

fn lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl EnrollForm {
    pub fn to_registration(&self, course_id: Option<i64>) -> NewRegistration {
        NewRegistration {
            course_id,
            full_name: Some(self.full_name.clone()),
            email: Some(self.email.clone()),
            phone: Some(self.phone.clone()),
            message: optional(&self.message),
        }
    }
}

/// Course editor. Checkboxes are absent from the body when unticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourseForm {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub thumbnail_url: String,
    pub teaser_url: String,
    pub location: String,
    pub instructor_name: String,
    pub price: String,
    pub level: String,
    pub session_count: String,
    pub category_id: String,
    /// One item per line.
    pub what_you_learn: String,
    pub prerequisites: String,
    pub coming_soon: Option<String>,
    pub published: Option<String>,
}

impl CourseForm {
    pub fn from_course(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            slug: course.slug.clone(),
            description: course.description.clone().unwrap_or_default(),
            thumbnail_url: course.thumbnail_url.clone().unwrap_or_default(),
            teaser_url: course.teaser_url.clone().unwrap_or_default(),
            location: course.location.clone().unwrap_or_default(),
            instructor_name: course.instructor_name.clone().unwrap_or_default(),
            price: course.price.to_string(),
            level: course.level.as_str().to_string(),
            session_count: course.session_count.to_string(),
            category_id: course.category_id.map(|id| id.to_string()).unwrap_or_default(),
            what_you_learn: course.what_you_learn.join("\n"),
            prerequisites: course.prerequisites.join("\n"),
            coming_soon: course.coming_soon.then(|| "on".to_string()),
            published: course.published.then(|| "on".to_string()),
        }
    }

    fn level(&self) -> Result<Option<CourseLevel>> {
        match present(Some(&self.level)) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: ParseEnumError| AcademyError::validation(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn to_new_course(&self) -> Result<NewCourse> {
        Ok(NewCourse {
            title: self.title.clone(),
            slug: optional(&self.slug),
            description: optional(&self.description),
            thumbnail_url: optional(&self.thumbnail_url),
            teaser_url: optional(&self.teaser_url),
            location: optional(&self.location),
            instructor_name: optional(&self.instructor_name),
            price: number(&self.price, "price")?,
            level: self.level()?,
            session_count: number(&self.session_count, "session_count")?,
            coming_soon: Some(self.coming_soon.is_some()),
            what_you_learn: lines(&self.what_you_learn),
            prerequisites: lines(&self.prerequisites),
            category_id: number(&self.category_id, "category_id")?,
            instructor_id: None,
            published: Some(self.published.is_some()),
        })
    }

    /// The editor always posts every field, so the patch replaces them all.
    /// A blank slug keeps the current one.
    pub fn to_patch(&self, course_id: i64) -> Result<CoursePatch> {
        Ok(CoursePatch {
            id: Some(course_id),
            title: Some(self.title.clone()),
            slug: optional(&self.slug),
            description: Some(optional(&self.description)),
            thumbnail_url: Some(optional(&self.thumbnail_url)),
            teaser_url: Some(optional(&self.teaser_url)),
            location: Some(optional(&self.location)),
            instructor_name: Some(optional(&self.instructor_name)),
            price: Some(number(&self.price, "price")?.unwrap_or(0)),
            level: self.level()?,
            session_count: Some(number(&self.session_count, "session_count")?.unwrap_or(0)),
            coming_soon: Some(self.coming_soon.is_some()),
            what_you_learn: Some(lines(&self.what_you_learn)),
            prerequisites: Some(lines(&self.prerequisites)),
            category_id: Some(number(&self.category_id, "category_id")?),
            instructor_id: None,
            published: Some(self.published.is_some()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LessonForm {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub video_url: String,
    pub duration_minutes: String,
    pub order_index: String,
    pub is_free: Option<String>,
}

impl LessonForm {
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            title: lesson.title.clone(),
            slug: lesson.slug.clone(),
            description: lesson.description.clone().unwrap_or_default(),
            video_url: lesson.video_url.clone().unwrap_or_default(),
            duration_minutes: lesson.duration_minutes.to_string(),
            order_index: lesson.order_index.to_string(),
            is_free: lesson.is_free.then(|| "on".to_string()),
        }
    }

    pub fn to_new_lesson(&self, course_id: i64) -> Result<NewLesson> {
        Ok(NewLesson {
            course_id: Some(course_id),
            title: self.title.clone(),
            slug: optional(&self.slug),
            description: optional(&self.description),
            video_url: optional(&self.video_url),
            duration_minutes: number(&self.duration_minutes, "duration_minutes")?,
            order_index: number(&self.order_index, "order_index")?,
            is_free: Some(self.is_free.is_some()),
        })
    }

    pub fn to_patch(&self, lesson_id: i64) -> Result<LessonPatch> {
        Ok(LessonPatch {
            id: Some(lesson_id),
            title: Some(self.title.clone()),
            slug: optional(&self.slug),
            description: Some(optional(&self.description)),
            video_url: Some(optional(&self.video_url)),
            duration_minutes: Some(number(&self.duration_minutes, "duration_minutes")?.unwrap_or(0)),
            order_index: number(&self.order_index, "order_index")?,
            is_free: Some(self.is_free.is_some()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_persian_digits_and_grouping() {
        assert_eq!(number("۲٬۵۰۰٬۰۰۰", "price").unwrap(), Some(2_500_000));
        assert_eq!(number(" 1,500 ", "price").unwrap(), Some(1500));
        assert_eq!(number("", "price").unwrap(), None);
        assert!(number("free", "price").is_err());
        assert_eq!(number("١٬٥٠٠", "price").unwrap(), Some(1500));
    }

    #[test]
    fn course_form_maps_checkboxes_and_lines() {
        let form = CourseForm {
            title: "Revit".to_string(),
            price: "1000".to_string(),
            level: "advanced".to_string(),
            what_you_learn: "walls\n\n  roofs \n".to_string(),
            published: Some("on".to_string()),
            ..Default::default()
        };
        let course = form.to_new_course().unwrap();
        assert_eq!(course.price, Some(1000));
        assert_eq!(course.level, Some(CourseLevel::Advanced));
        assert_eq!(course.what_you_learn, vec!["walls", "roofs"]);
        assert_eq!(course.published, Some(true));
        assert_eq!(course.coming_soon, Some(false));
        assert_eq!(course.slug, None);

        let patch = form.to_patch(7).unwrap();
        assert_eq!(patch.category_id, Some(None));
        assert_eq!(patch.description, Some(None));
    }
}
