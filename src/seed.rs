//! Sample catalog used for local development and demos.

use crate::catalog::Catalog;
use crate::domain::*;
use crate::error::Result;
use chrono::Utc;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub instructors: usize,
    pub courses: usize,
    pub lessons: usize,
}

struct CourseSeed {
    title: &'static str,
    slug: &'static str,
    description: &'static str,
    thumbnail_url: &'static str,
    price: i64,
    level: CourseLevel,
}

const CATEGORIES: [(&str, &str, &str); 3] = [
    ("نرم‌افزارهای طراحی", "design-software", "آموزش نرم‌افزارهای تخصصی طراحی و معماری"),
    ("معماری", "architecture", "دوره‌های تخصصی معماری و طراحی ساختمان"),
    ("طراحی داخلی", "interior-design", "آموزش اصول و تکنیک‌های طراحی داخلی"),
];

const INSTRUCTORS: [(&str, &str, &str); 3] = [
    (
        "instructor@hiarchitect.ir",
        "دکتر احمد محمدی",
        "استاد دانشگاه و متخصص معماری با بیش از ۱۵ سال تجربه",
    ),
    (
        "instructor2@hiarchitect.ir",
        "مهندس سارا احمدی",
        "معمار و طراح داخلی با تجربه بین‌المللی",
    ),
    (
        "instructor3@hiarchitect.ir",
        "مهندس رضا کریمی",
        "متخصص طراحی داخلی و دکوراسیون",
    ),
];

const COURSES: [CourseSeed; 3] = [
    CourseSeed {
        title: "آموزش جامع Revit برای معماران",
        slug: "revit-complete-course",
        description: "در این دوره جامع، تمامی مباحث مورد نیاز برای کار حرفه‌ای با نرم‌افزار Revit را فراخواهید گرفت",
        thumbnail_url: "/static/img/revit-architecture-software.jpg",
        price: 2_500_000,
        level: CourseLevel::Intermediate,
    },
    CourseSeed {
        title: "اصول طراحی معماری پایدار",
        slug: "sustainable-architecture",
        description: "آشنایی با اصول و تکنیک‌های طراحی معماری پایدار و سبز",
        thumbnail_url: "/static/img/sustainable-green-architecture.png",
        price: 1_800_000,
        level: CourseLevel::Beginner,
    },
    CourseSeed {
        title: "طراحی داخلی مدرن",
        slug: "modern-interior-design",
        description: "یادگیری اصول طراحی داخلی مدرن و معاصر",
        thumbnail_url: "/static/img/modern-interior.png",
        price: 1_500_000,
        level: CourseLevel::Beginner,
    },
];

// (title, slug, description, minutes, order, free), all for the first course
const REVIT_LESSONS: [(&str, &str, &str, i64, i64, bool); 3] = [
    (
        "مقدمه و آشنایی با محیط Revit",
        "introduction-to-revit",
        "در این جلسه با محیط کاری Revit و ابزارهای اولیه آشنا می‌شوید",
        45,
        1,
        true,
    ),
    (
        "ایجاد اولین پروژه",
        "first-project",
        "شروع کار با پروژه جدید و تنظیمات اولیه",
        60,
        2,
        true,
    ),
    (
        "مدل‌سازی دیوارها و کف‌ها",
        "walls-and-floors",
        "آموزش ایجاد و ویرایش دیوارها و کف‌های ساختمان",
        75,
        3,
        false,
    ),
];

/// Inserts the sample catalog. Does nothing when it is already present.
pub async fn seed(catalog: &Catalog) -> Result<SeedSummary> {
    let storage = catalog.storage();
    let mut summary = SeedSummary::default();

    if storage.get_category_by_slug(CATEGORIES[0].1).await?.is_some() {
        warn!("Sample data already present, skipping seed");
        return Ok(summary);
    }

    let mut category_ids = Vec::new();
    for (name, slug, description) in CATEGORIES {
        let category = catalog
            .create_category(name, Some(slug), Some(description.to_string()))
            .await?;
        category_ids.push(category.id);
        summary.categories += 1;
    }
    info!("Categories created");

    let mut instructor_ids = Vec::new();
    for (email, name, bio) in INSTRUCTORS {
        let now = Utc::now();
        let mut user = User {
            id: None,
            email: email.to_string(),
            name: name.to_string(),
            role: UserRole::Instructor,
            avatar_url: None,
            bio: Some(bio.to_string()),
            created_at: now,
            updated_at: now,
        };
        storage.create_user(&mut user).await?;
        instructor_ids.push((user.id, user.name));
        summary.instructors += 1;
    }
    info!("Instructors created");

    let mut first_course_id = None;
    for ((seed, category_id), (instructor_id, instructor_name)) in
        COURSES.iter().zip(category_ids).zip(instructor_ids)
    {
        let course = catalog
            .create_course(NewCourse {
                title: seed.title.to_string(),
                slug: Some(seed.slug.to_string()),
                description: Some(seed.description.to_string()),
                thumbnail_url: Some(seed.thumbnail_url.to_string()),
                instructor_name: Some(instructor_name),
                price: Some(seed.price),
                level: Some(seed.level),
                category_id,
                instructor_id,
                published: Some(true),
                ..Default::default()
            })
            .await?;
        first_course_id = first_course_id.or(course.id);
        summary.courses += 1;
    }
    info!("Courses created");

    for (title, slug, description, minutes, order, free) in REVIT_LESSONS {
        catalog
            .create_lesson(NewLesson {
                course_id: first_course_id,
                title: title.to_string(),
                slug: Some(slug.to_string()),
                description: Some(description.to_string()),
                video_url: None,
                duration_minutes: Some(minutes),
                order_index: Some(order),
                is_free: Some(free),
            })
            .await?;
        summary.lessons += 1;
    }
    info!("Lessons created");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn seeds_once() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::new(Arc::new(InMemoryStorage::new()), dir.path());

        let summary = seed(&catalog).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                categories: 3,
                instructors: 3,
                courses: 3,
                lessons: 3
            }
        );

        let detail = catalog.course_detail("revit-complete-course").await.unwrap();
        assert_eq!(detail.lessons.len(), 3);
        assert_eq!(detail.lessons[0].slug, "introduction-to-revit");
        assert!(detail.instructor.is_some());
        assert_eq!(detail.category.unwrap().slug, "design-software");

        let again = seed(&catalog).await.unwrap();
        assert_eq!(again, SeedSummary::default());
    }
}
