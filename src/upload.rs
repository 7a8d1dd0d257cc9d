use crate::constants::{COURSES_DIR, MEDIA_URL_PREFIX};
use crate::error::{AcademyError, Result};
use crate::slug::is_valid_slug;
use crate::validation::is_safe_file_name;
use std::path::Path;
use tracing::info;

/// Writes an uploaded file into the course's media directory and returns its public URL.
///
/// Existing files with the same name are overwritten.
pub async fn store_course_file(
    upload_root: &Path,
    course_slug: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<String> {
    if !is_valid_slug(course_slug) {
        return Err(AcademyError::validation("courseSlug is not a valid slug"));
    }
    if !is_safe_file_name(file_name) {
        return Err(AcademyError::validation("file name is not allowed"));
    }

    let dir = upload_root.join(COURSES_DIR).join(course_slug);
    tokio::fs::create_dir_all(&dir).await?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;

    info!(path = %path.display(), size = bytes.len(), "Stored upload");
    Ok(media_url(course_slug, file_name))
}

pub fn media_url(course_slug: &str, file_name: &str) -> String {
    format!("{MEDIA_URL_PREFIX}/{COURSES_DIR}/{course_slug}/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stores_under_course_directory() {
        let dir = tempdir().unwrap();
        let url = store_course_file(dir.path(), "revit", "intro.mp4", b"video")
            .await
            .unwrap();

        assert_eq!(url, "/media/courses/revit/intro.mp4");
        let written = std::fs::read(dir.path().join("courses/revit/intro.mp4")).unwrap();
        assert_eq!(written, b"video");

        store_course_file(dir.path(), "revit", "intro.mp4", b"v2").await.unwrap();
        let written = std::fs::read(dir.path().join("courses/revit/intro.mp4")).unwrap();
        assert_eq!(written, b"v2");
    }

    #[tokio::test]
    async fn rejects_paths_that_escape() {
        let dir = tempdir().unwrap();
        assert!(store_course_file(dir.path(), "../etc", "x.png", b"").await.is_err());
        assert!(store_course_file(dir.path(), "revit", "../x.png", b"").await.is_err());
        assert!(store_course_file(dir.path(), "revit", "", b"").await.is_err());
    }
}
