use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Instructor,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Where a guest registration stands. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Contacted,
    Enrolled,
    Rejected,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
        }
    }
}

impl CourseLevel {
    pub const ALL: [CourseLevel; 3] = [
        CourseLevel::Beginner,
        CourseLevel::Intermediate,
        CourseLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "مقدماتی",
            CourseLevel::Intermediate => "متوسط",
            CourseLevel::Advanced => "پیشرفته",
        }
    }
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 4] = [
        RegistrationStatus::Pending,
        RegistrationStatus::Contacted,
        RegistrationStatus::Enrolled,
        RegistrationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Contacted => "contacted",
            RegistrationStatus::Enrolled => "enrolled",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "در انتظار",
            RegistrationStatus::Contacted => "تماس گرفته شده",
            RegistrationStatus::Enrolled => "ثبت‌نام شده",
            RegistrationStatus::Rejected => "رد شده",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError(String);

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseEnumError {}

macro_rules! str_enum {
    ($ty:ty, $what:literal, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| ParseEnumError(format!("Unknown {}: {}", $what, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(UserRole, "user role", [UserRole::Student, UserRole::Instructor, UserRole::Admin]);
str_enum!(
    CourseLevel,
    "course level",
    [CourseLevel::Beginner, CourseLevel::Intermediate, CourseLevel::Advanced]
);
str_enum!(
    RegistrationStatus,
    "registration status",
    [
        RegistrationStatus::Pending,
        RegistrationStatus::Contacted,
        RegistrationStatus::Enrolled,
        RegistrationStatus::Rejected,
    ]
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub teaser_url: Option<String>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    /// Whole toman.
    pub price: i64,
    pub level: CourseLevel,
    pub session_count: i64,
    pub coming_soon: bool,
    pub what_you_learn: Vec<String>,
    pub prerequisites: Vec<String>,
    pub category_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Option<i64>,
    pub course_id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: i64,
    pub order_index: i64,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Option<i64>,
    pub course_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Read models returned by the catalog

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub category: Option<Category>,
    pub lesson_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub category: Option<Category>,
    pub instructor: Option<User>,
    pub lessons: Vec<Lesson>,
    pub lesson_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub course_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseRef {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationWithCourse {
    #[serde(flatten)]
    pub registration: Registration,
    pub course: Option<CourseRef>,
}

/// A lesson in the context of its course's ordered syllabus.
#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub course: Course,
    pub lesson: Lesson,
    pub lessons: Vec<Lesson>,
    pub position: usize,
    pub previous: Option<Lesson>,
    pub next: Option<Lesson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub courses_count: usize,
    pub published_courses_count: usize,
    pub lessons_count: usize,
    pub registrations_count: usize,
    pub pending_registrations_count: usize,
    pub recent_courses: Vec<Course>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
}

// Write models accepted by the catalog

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCourse {
    #[serde(default)]
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub teaser_url: Option<String>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    pub price: Option<i64>,
    pub level: Option<CourseLevel>,
    pub session_count: Option<i64>,
    pub coming_soon: Option<bool>,
    #[serde(default, deserialize_with = "string_list")]
    pub what_you_learn: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub prerequisites: Vec<String>,
    pub category_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub published: Option<bool>,
}

/// Partial course update. Outer `None` leaves a field untouched; for nullable
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub thumbnail_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub teaser_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub instructor_name: Option<Option<String>>,
    pub price: Option<i64>,
    pub level: Option<CourseLevel>,
    pub session_count: Option<i64>,
    pub coming_soon: Option<bool>,
    #[serde(default, deserialize_with = "optional_string_list")]
    pub what_you_learn: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_string_list")]
    pub prerequisites: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub instructor_id: Option<Option<i64>>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLesson {
    pub course_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i64>,
    pub order_index: Option<i64>,
    pub is_free: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonPatch {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub video_url: Option<Option<String>>,
    pub duration_minutes: Option<i64>,
    pub order_index: Option<i64>,
    pub is_free: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRegistration {
    pub course_id: Option<i64>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    pub id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringListRepr {
    List(Vec<String>),
    Encoded(String),
}

fn decode_string_list<E: serde::de::Error>(repr: Option<StringListRepr>) -> Result<Vec<String>, E> {
    match repr {
        None => Ok(Vec::new()),
        Some(StringListRepr::List(items)) => Ok(items),
        Some(StringListRepr::Encoded(text)) if text.trim().is_empty() => Ok(Vec::new()),
        Some(StringListRepr::Encoded(text)) => serde_json::from_str(&text).map_err(E::custom),
    }
}

/// Accepts `["a","b"]`, the string `"[\"a\",\"b\"]"` or `null`.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<StringListRepr>::deserialize(deserializer)?;
    decode_string_list(repr)
}

fn optional_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<StringListRepr>::deserialize(deserializer)?;
    decode_string_list(repr).map(Some)
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parses the JSON text stored in list columns, tolerating blanks.
pub fn parse_list_column(text: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    match text {
        Some(t) if !t.trim().is_empty() => serde_json::from_str(t),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_course_accepts_encoded_lists() {
        let course: NewCourse = serde_json::from_str(
            r#"{"title":"Revit","what_you_learn":"[\"walls\",\"roofs\"]","prerequisites":["windows"]}"#,
        )
        .unwrap();
        assert_eq!(course.what_you_learn, vec!["walls", "roofs"]);
        assert_eq!(course.prerequisites, vec!["windows"]);

        let course: NewCourse = serde_json::from_str(r#"{"title":"x","what_you_learn":null}"#).unwrap();
        assert!(course.what_you_learn.is_empty());
    }

    #[test]
    fn patch_distinguishes_null_from_missing() {
        let patch: CoursePatch =
            serde_json::from_str(r#"{"id":4,"location":null,"price":100}"#).unwrap();
        assert_eq!(patch.id, Some(4));
        assert_eq!(patch.location, Some(None));
        assert_eq!(patch.description, None);
        assert_eq!(patch.price, Some(100));
        assert_eq!(patch.what_you_learn, None);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Contacted".parse::<RegistrationStatus>().unwrap(), RegistrationStatus::Contacted);
        assert_eq!("advanced".parse::<CourseLevel>().unwrap(), CourseLevel::Advanced);
        assert!("archived".parse::<RegistrationStatus>().is_err());
        assert_eq!(RegistrationStatus::Enrolled.to_string(), "enrolled");
    }

    #[test]
    fn summary_flattens_course_fields() {
        let now = Utc::now();
        let summary = CourseSummary {
            course: Course {
                id: Some(1),
                title: "Revit".to_string(),
                slug: "revit".to_string(),
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
                created_at: now,
                updated_at: now,
            },
            category: None,
            lesson_count: 2,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["slug"], "revit");
        assert_eq!(json["level"], "beginner");
        assert_eq!(json["lesson_count"], 2);
    }
}
