use super::traits::Storage;
use crate::db::DatabaseManager;
use crate::domain::*;
use crate::error::{AcademyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Row, Rows, Value};
use std::path::Path;
use tracing::{debug, info};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at";
const USER_COLUMNS: &str = "id, email, name, role, avatar_url, bio, created_at, updated_at";
const COURSE_COLUMNS: &str = "id, title, slug, description, thumbnail_url, teaser_url, location, \
     instructor_name, price, level, session_count, coming_soon, what_you_learn, prerequisites, \
     category_id, instructor_id, published, created_at, updated_at";
const LESSON_COLUMNS: &str = "id, course_id, title, slug, description, video_url, duration_minutes, \
     order_index, is_free, created_at, updated_at";
const REGISTRATION_COLUMNS: &str =
    "id, course_id, full_name, email, phone, message, status, created_at, updated_at";

/// Database storage implementation using libSQL over a local SQLite file
pub struct DatabaseStorage {
    db: DatabaseManager,
}

impl DatabaseStorage {
    /// Opens the database and brings the schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = DatabaseManager::open(path).await?;
        db.run_migrations().await?;
        info!("Database storage ready at {}", db.path().display());
        Ok(Self { db })
    }

    async fn query_all<T>(
        &self,
        sql: &str,
        params: Vec<Value>,
        convert: fn(&Row) -> Result<T>,
    ) -> Result<Vec<T>> {
        let conn = self.db.get_connection().await?;
        let mut rows = conn.query(sql, params).await.map_err(db_error("query"))?;
        collect_rows(&mut rows, convert).await
    }

    async fn query_one<T>(
        &self,
        sql: &str,
        params: Vec<Value>,
        convert: fn(&Row) -> Result<T>,
    ) -> Result<Option<T>> {
        Ok(self.query_all(sql, params, convert).await?.into_iter().next())
    }

    async fn count(&self, sql: &str, params: Vec<Value>) -> Result<usize> {
        let counts = self.query_all(sql, params, |row| int(row, 0)).await?;
        Ok(counts.into_iter().next().unwrap_or_default().max(0) as usize)
    }

    /// Runs an INSERT and returns the new row id.
    async fn insert(&self, what: &str, sql: &str, params: Vec<Value>) -> Result<i64> {
        let conn = self.db.get_connection().await?;
        conn.execute(sql, params).await.map_err(write_error(what))?;
        Ok(conn.last_insert_rowid())
    }

    async fn execute(&self, what: &str, sql: &str, params: Vec<Value>) -> Result<u64> {
        let conn = self.db.get_connection().await?;
        conn.execute(sql, params).await.map_err(write_error(what))
    }
}

// Conversion helpers

fn db_error(context: &'static str) -> impl Fn(libsql::Error) -> AcademyError {
    move |e| AcademyError::Database {
        message: format!("Failed to {context}: {e}"),
    }
}

/// Constraint failures become client errors; everything else is a database error.
fn write_error(what: &str) -> impl Fn(libsql::Error) -> AcademyError + '_ {
    move |e| {
        let message = e.to_string();
        if message.contains("UNIQUE constraint failed") {
            AcademyError::conflict(format!("{what} already exists"))
        } else if message.contains("FOREIGN KEY constraint failed") {
            AcademyError::conflict(format!("{what} references missing or dependent rows"))
        } else {
            AcademyError::Database {
                message: format!("Failed to write {what}: {message}"),
            }
        }
    }
}

async fn collect_rows<T>(rows: &mut Rows, convert: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    let mut results = Vec::new();
    while let Some(row) = rows.next().await.map_err(db_error("read row"))? {
        results.push(convert(&row)?);
    }
    Ok(results)
}

fn value(row: &Row, idx: i32) -> Result<Value> {
    row.get_value(idx).map_err(|e| AcademyError::Database {
        message: format!("Failed to get column {idx}: {e}"),
    })
}

fn unexpected(idx: i32, found: &Value) -> AcademyError {
    AcademyError::Database {
        message: format!("Unexpected value in column {idx}: {found:?}"),
    }
}

fn opt_int(row: &Row, idx: i32) -> Result<Option<i64>> {
    match value(row, idx)? {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(i)),
        other => Err(unexpected(idx, &other)),
    }
}

fn int(row: &Row, idx: i32) -> Result<i64> {
    opt_int(row, idx)?.ok_or_else(|| unexpected(idx, &Value::Null))
}

fn flag(row: &Row, idx: i32) -> Result<bool> {
    Ok(int(row, idx)? != 0)
}

fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match value(row, idx)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(unexpected(idx, &other)),
    }
}

fn text(row: &Row, idx: i32) -> Result<String> {
    opt_text(row, idx)?.ok_or_else(|| unexpected(idx, &Value::Null))
}

fn timestamp(row: &Row, idx: i32) -> Result<DateTime<Utc>> {
    let raw = text(row, idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AcademyError::Database {
            message: format!("Invalid timestamp '{raw}': {e}"),
        })
}

fn parsed<T: std::str::FromStr>(row: &Row, idx: i32) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = text(row, idx)?;
    raw.parse().map_err(|e: T::Err| AcademyError::Database {
        message: format!("Invalid value '{raw}' in column {idx}: {e}"),
    })
}

fn list(row: &Row, idx: i32) -> Result<Vec<String>> {
    let raw = opt_text(row, idx)?;
    parse_list_column(raw.as_deref()).map_err(|e| AcademyError::Database {
        message: format!("Invalid list in column {idx}: {e}"),
    })
}

fn ts(value: &DateTime<Utc>) -> Value {
    Value::Text(value.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn opt_str(value: &Option<String>) -> Value {
    value.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn opt_i64(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

fn json_list(items: &[String]) -> Result<Value> {
    Ok(Value::Text(serde_json::to_string(items)?))
}

fn row_to_category(row: &Row) -> Result<Category> {
    Ok(Category {
        id: Some(int(row, 0)?),
        name: text(row, 1)?,
        slug: text(row, 2)?,
        description: opt_text(row, 3)?,
        created_at: timestamp(row, 4)?,
    })
}

fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: Some(int(row, 0)?),
        email: text(row, 1)?,
        name: text(row, 2)?,
        role: parsed(row, 3)?,
        avatar_url: opt_text(row, 4)?,
        bio: opt_text(row, 5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
    })
}

fn row_to_course(row: &Row) -> Result<Course> {
    Ok(Course {
        id: Some(int(row, 0)?),
        title: text(row, 1)?,
        slug: text(row, 2)?,
        description: opt_text(row, 3)?,
        thumbnail_url: opt_text(row, 4)?,
        teaser_url: opt_text(row, 5)?,
        location: opt_text(row, 6)?,
        instructor_name: opt_text(row, 7)?,
        price: int(row, 8)?,
        level: parsed(row, 9)?,
        session_count: int(row, 10)?,
        coming_soon: flag(row, 11)?,
        what_you_learn: list(row, 12)?,
        prerequisites: list(row, 13)?,
        category_id: opt_int(row, 14)?,
        instructor_id: opt_int(row, 15)?,
        published: flag(row, 16)?,
        created_at: timestamp(row, 17)?,
        updated_at: timestamp(row, 18)?,
    })
}

fn row_to_lesson(row: &Row) -> Result<Lesson> {
    Ok(Lesson {
        id: Some(int(row, 0)?),
        course_id: int(row, 1)?,
        title: text(row, 2)?,
        slug: text(row, 3)?,
        description: opt_text(row, 4)?,
        video_url: opt_text(row, 5)?,
        duration_minutes: int(row, 6)?,
        order_index: int(row, 7)?,
        is_free: flag(row, 8)?,
        created_at: timestamp(row, 9)?,
        updated_at: timestamp(row, 10)?,
    })
}

fn row_to_registration(row: &Row) -> Result<Registration> {
    Ok(Registration {
        id: Some(int(row, 0)?),
        course_id: int(row, 1)?,
        full_name: text(row, 2)?,
        email: text(row, 3)?,
        phone: text(row, 4)?,
        message: opt_text(row, 5)?,
        status: parsed(row, 6)?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
    })
}

fn course_values(course: &Course) -> Result<Vec<Value>> {
    Ok(vec![
        Value::Text(course.title.clone()),
        Value::Text(course.slug.clone()),
        opt_str(&course.description),
        opt_str(&course.thumbnail_url),
        opt_str(&course.teaser_url),
        opt_str(&course.location),
        opt_str(&course.instructor_name),
        Value::Integer(course.price),
        Value::Text(course.level.as_str().to_string()),
        Value::Integer(course.session_count),
        Value::Integer(course.coming_soon as i64),
        json_list(&course.what_you_learn)?,
        json_list(&course.prerequisites)?,
        opt_i64(course.category_id),
        opt_i64(course.instructor_id),
        Value::Integer(course.published as i64),
        ts(&course.created_at),
        ts(&course.updated_at),
    ])
}

fn lesson_values(lesson: &Lesson) -> Vec<Value> {
    vec![
        Value::Integer(lesson.course_id),
        Value::Text(lesson.title.clone()),
        Value::Text(lesson.slug.clone()),
        opt_str(&lesson.description),
        opt_str(&lesson.video_url),
        Value::Integer(lesson.duration_minutes),
        Value::Integer(lesson.order_index),
        Value::Integer(lesson.is_free as i64),
        ts(&lesson.created_at),
        ts(&lesson.updated_at),
    ]
}

fn registration_values(registration: &Registration) -> Vec<Value> {
    vec![
        Value::Integer(registration.course_id),
        Value::Text(registration.full_name.clone()),
        Value::Text(registration.email.clone()),
        Value::Text(registration.phone.clone()),
        opt_str(&registration.message),
        Value::Text(registration.status.as_str().to_string()),
        ts(&registration.created_at),
        ts(&registration.updated_at),
    ]
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_category(&self, category: &mut Category) -> Result<()> {
        let id = self
            .insert(
                "Category",
                "INSERT INTO categories (name, slug, description, created_at) VALUES (?, ?, ?, ?)",
                vec![
                    Value::Text(category.name.clone()),
                    Value::Text(category.slug.clone()),
                    opt_str(&category.description),
                    ts(&category.created_at),
                ],
            )
            .await?;
        category.id = Some(id);

        debug!("Inserted category: {} with id {}", category.slug, id);
        Ok(())
    }

    async fn get_category_by_id(&self, category_id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?");
        self.query_one(&sql, vec![Value::Integer(category_id)], row_to_category)
            .await
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?");
        self.query_one(&sql, vec![Value::Text(slug.to_string())], row_to_category)
            .await
    }

    async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id");
        self.query_all(&sql, vec![], row_to_category).await
    }

    async fn create_user(&self, user: &mut User) -> Result<()> {
        let id = self
            .insert(
                "User",
                "INSERT INTO users (email, name, role, avatar_url, bio, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(user.email.clone()),
                    Value::Text(user.name.clone()),
                    Value::Text(user.role.as_str().to_string()),
                    opt_str(&user.avatar_url),
                    opt_str(&user.bio),
                    ts(&user.created_at),
                    ts(&user.updated_at),
                ],
            )
            .await?;
        user.id = Some(id);

        debug!("Inserted user: {} with id {}", user.email, id);
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        self.query_one(&sql, vec![Value::Integer(user_id)], row_to_user).await
    }

    async fn create_course(&self, course: &mut Course) -> Result<()> {
        let id = self
            .insert(
                "Course",
                "INSERT INTO courses (title, slug, description, thumbnail_url, teaser_url, location, \
                 instructor_name, price, level, session_count, coming_soon, what_you_learn, \
                 prerequisites, category_id, instructor_id, published, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                course_values(course)?,
            )
            .await?;
        course.id = Some(id);

        info!("Inserted course: {} with id {}", course.slug, id);
        Ok(())
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let course_id = course
            .id
            .ok_or_else(|| AcademyError::validation("Cannot update course without ID"))?;

        let mut params = course_values(course)?;
        params.push(Value::Integer(course_id));

        let changed = self
            .execute(
                "Course",
                "UPDATE courses SET title = ?, slug = ?, description = ?, thumbnail_url = ?, \
                 teaser_url = ?, location = ?, instructor_name = ?, price = ?, level = ?, \
                 session_count = ?, coming_soon = ?, what_you_learn = ?, prerequisites = ?, \
                 category_id = ?, instructor_id = ?, published = ?, created_at = ?, updated_at = ? \
                 WHERE id = ?",
                params,
            )
            .await?;
        if changed == 0 {
            return Err(AcademyError::not_found("Course"));
        }

        debug!("Updated course: {} with id {}", course.slug, course_id);
        Ok(())
    }

    async fn delete_course(&self, course_id: i64) -> Result<bool> {
        let conn = self.db.get_connection().await?;
        let tx = conn.transaction().await.map_err(db_error("begin transaction"))?;

        tx.execute("DELETE FROM lessons WHERE course_id = ?", vec![Value::Integer(course_id)])
            .await
            .map_err(write_error("Lesson"))?;
        let removed = tx
            .execute("DELETE FROM courses WHERE id = ?", vec![Value::Integer(course_id)])
            .await
            .map_err(write_error("Course"))?;

        tx.commit().await.map_err(db_error("commit course deletion"))?;

        if removed > 0 {
            info!("Deleted course {} and its lessons", course_id);
        }
        Ok(removed > 0)
    }

    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?");
        self.query_one(&sql, vec![Value::Integer(course_id)], row_to_course).await
    }

    async fn get_course_by_slug(&self, slug: &str) -> Result<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE slug = ?");
        self.query_one(&sql, vec![Value::Text(slug.to_string())], row_to_course)
            .await
    }

    async fn get_all_courses(&self) -> Result<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC, id DESC");
        self.query_all(&sql, vec![], row_to_course).await
    }

    async fn create_lesson(&self, lesson: &mut Lesson) -> Result<()> {
        let id = self
            .insert(
                "Lesson",
                "INSERT INTO lessons (course_id, title, slug, description, video_url, duration_minutes, \
                 order_index, is_free, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                lesson_values(lesson),
            )
            .await?;
        lesson.id = Some(id);

        debug!("Inserted lesson: {} with id {}", lesson.slug, id);
        Ok(())
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<()> {
        let lesson_id = lesson
            .id
            .ok_or_else(|| AcademyError::validation("Cannot update lesson without ID"))?;

        let mut params = lesson_values(lesson);
        params.push(Value::Integer(lesson_id));

        let changed = self
            .execute(
                "Lesson",
                "UPDATE lessons SET course_id = ?, title = ?, slug = ?, description = ?, video_url = ?, \
                 duration_minutes = ?, order_index = ?, is_free = ?, created_at = ?, updated_at = ? \
                 WHERE id = ?",
                params,
            )
            .await?;
        if changed == 0 {
            return Err(AcademyError::not_found("Lesson"));
        }
        Ok(())
    }

    async fn delete_lesson(&self, lesson_id: i64) -> Result<bool> {
        let removed = self
            .execute(
                "Lesson",
                "DELETE FROM lessons WHERE id = ?",
                vec![Value::Integer(lesson_id)],
            )
            .await?;
        Ok(removed > 0)
    }

    async fn get_lesson_by_id(&self, lesson_id: i64) -> Result<Option<Lesson>> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?");
        self.query_one(&sql, vec![Value::Integer(lesson_id)], row_to_lesson).await
    }

    async fn get_lessons_by_course_id(&self, course_id: i64) -> Result<Vec<Lesson>> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = ? ORDER BY order_index, id"
        );
        self.query_all(&sql, vec![Value::Integer(course_id)], row_to_lesson).await
    }

    async fn count_lessons_by_course_id(&self, course_id: i64) -> Result<usize> {
        self.count(
            "SELECT COUNT(*) FROM lessons WHERE course_id = ?",
            vec![Value::Integer(course_id)],
        )
        .await
    }

    async fn count_lessons(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM lessons", vec![]).await
    }

    async fn create_registration(&self, registration: &mut Registration) -> Result<()> {
        let id = self
            .insert(
                "Registration",
                "INSERT INTO course_registrations (course_id, full_name, email, phone, message, status, \
                 created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                registration_values(registration),
            )
            .await?;
        registration.id = Some(id);

        info!("Inserted registration {} for course {}", id, registration.course_id);
        Ok(())
    }

    async fn update_registration(&self, registration: &Registration) -> Result<()> {
        let registration_id = registration
            .id
            .ok_or_else(|| AcademyError::validation("Cannot update registration without ID"))?;

        let mut params = registration_values(registration);
        params.push(Value::Integer(registration_id));

        let changed = self
            .execute(
                "Registration",
                "UPDATE course_registrations SET course_id = ?, full_name = ?, email = ?, phone = ?, \
                 message = ?, status = ?, created_at = ?, updated_at = ? WHERE id = ?",
                params,
            )
            .await?;
        if changed == 0 {
            return Err(AcademyError::not_found("Registration"));
        }
        Ok(())
    }

    async fn get_registration_by_id(&self, registration_id: i64) -> Result<Option<Registration>> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM course_registrations WHERE id = ?");
        self.query_one(&sql, vec![Value::Integer(registration_id)], row_to_registration)
            .await
    }

    async fn get_all_registrations(&self) -> Result<Vec<Registration>> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM course_registrations ORDER BY created_at DESC, id DESC"
        );
        self.query_all(&sql, vec![], row_to_registration).await
    }

    async fn count_registrations_by_course_id(&self, course_id: i64) -> Result<usize> {
        self.count(
            "SELECT COUNT(*) FROM course_registrations WHERE course_id = ?",
            vec![Value::Integer(course_id)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn course(slug: &str) -> Course {
        let now = Utc::now();
        Course {
            id: None,
            title: "Revit".to_string(),
            slug: slug.to_string(),
            description: Some("BIM".to_string()),
            thumbnail_url: None,
            teaser_url: None,
            location: Some("Tehran".to_string()),
            instructor_name: None,
            price: 2_500_000,
            level: CourseLevel::Intermediate,
            session_count: 12,
            coming_soon: false,
            what_you_learn: vec!["walls".to_string(), "roofs".to_string()],
            prerequisites: vec![],
            category_id: None,
            instructor_id: None,
            published: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn course_round_trips_through_sqlite() {
        let dir = tempdir().unwrap();
        let storage = DatabaseStorage::open(dir.path().join("academy.db")).await.unwrap();

        let mut c = course("revit");
        storage.create_course(&mut c).await.unwrap();
        let stored = storage.get_course_by_slug("revit").await.unwrap().unwrap();

        assert_eq!(stored.id, c.id);
        assert_eq!(stored.level, CourseLevel::Intermediate);
        assert_eq!(stored.what_you_learn, vec!["walls", "roofs"]);
        assert_eq!(stored.location.as_deref(), Some("Tehran"));
        assert!(stored.published);
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let dir = tempdir().unwrap();
        let storage = DatabaseStorage::open(dir.path().join("academy.db")).await.unwrap();

        storage.create_course(&mut course("revit")).await.unwrap();
        let err = storage.create_course(&mut course("revit")).await.unwrap_err();
        assert!(matches!(err, AcademyError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_course_removes_lessons() {
        let dir = tempdir().unwrap();
        let storage = DatabaseStorage::open(dir.path().join("academy.db")).await.unwrap();

        let mut c = course("revit");
        storage.create_course(&mut c).await.unwrap();
        let course_id = c.id.unwrap();
        let now = Utc::now();
        for (slug, order) in [("b", 2), ("a", 1)] {
            let mut lesson = Lesson {
                id: None,
                course_id,
                title: slug.to_string(),
                slug: slug.to_string(),
                description: None,
                video_url: None,
                duration_minutes: 30,
                order_index: order,
                is_free: order == 1,
                created_at: now,
                updated_at: now,
            };
            storage.create_lesson(&mut lesson).await.unwrap();
        }

        let lessons = storage.get_lessons_by_course_id(course_id).await.unwrap();
        assert_eq!(lessons[0].slug, "a");
        assert!(lessons[0].is_free);

        assert!(storage.delete_course(course_id).await.unwrap());
        assert_eq!(storage.count_lessons().await.unwrap(), 0);
    }
}
