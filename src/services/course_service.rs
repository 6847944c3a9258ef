// src/services/course_service.rs
use crate::{
    error::{AppError, AppResult},
    models::course::Course,
};
use sqlx::SqlitePool;

pub async fn find_course_by_id(db_pool: &SqlitePool, course_id: i64) -> AppResult<Option<Course>> {
    tracing::debug!("Looking up course {}", course_id);
    let course = sqlx::query_as::<_, Course>(
        "SELECT id, name, description, created_at, updated_at FROM courses WHERE id = ?1",
    )
    .bind(course_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(course)
}

pub async fn find_all_courses(db_pool: &SqlitePool) -> AppResult<Vec<Course>> {
    let courses = sqlx::query_as::<_, Course>(
        "SELECT id, name, description, created_at, updated_at FROM courses ORDER BY name ASC, id ASC",
    )
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Loaded {} courses.", courses.len());
    Ok(courses)
}

pub async fn create_course(db_pool: &SqlitePool, name: &str, description: &str) -> AppResult<i64> {
    tracing::info!("Creating course '{}'", name);
    let id = sqlx::query("INSERT INTO courses (name, description) VALUES (?1, ?2)")
        .bind(name.trim())
        .bind(description.trim())
        .execute(db_pool)
        .await?
        .last_insert_rowid();
    tracing::info!("✅ Course {} created.", id);
    Ok(id)
}

pub async fn update_course(
    db_pool: &SqlitePool,
    course_id: i64,
    name: &str,
    description: &str,
) -> AppResult<()> {
    tracing::info!("Updating course {}", course_id);
    let rows_affected = sqlx::query("UPDATE courses SET name = ?1, description = ?2 WHERE id = ?3")
        .bind(name.trim())
        .bind(description.trim())
        .bind(course_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Course {} not found for update.", course_id);
        return Err(AppError::NotFound("Course"));
    }
    Ok(())
}

/// Deletes a course; its enrollments go with it (ON DELETE CASCADE).
pub async fn delete_course(db_pool: &SqlitePool, course_id: i64) -> AppResult<()> {
    tracing::info!("Deleting course {}", course_id);
    let rows_affected = sqlx::query("DELETE FROM courses WHERE id = ?1")
        .bind(course_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Course {} not found for deletion.", course_id);
        return Err(AppError::NotFound("Course"));
    }
    tracing::info!("🗑️ Course {} deleted.", course_id);
    Ok(())
}
