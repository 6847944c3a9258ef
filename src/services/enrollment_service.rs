// src/services/enrollment_service.rs
//
// Enrollment engine: capacity-gated requests, admin validation, waitlist
// promotion, mass enrollment and course duplication.
//
// Only `approved` rows occupy a seat. A request is accepted as `pending` while
// the course has fewer approved enrollments than its capacity and lands on the
// waitlist otherwise. A full course holds no `pending` rows. Every operation that reads counts and then writes runs
// inside a single transaction.
use crate::{
    config::EnrollmentPolicy,
    error::{is_unique_violation, AppError, AppResult},
    models::{
        course::{Course, CourseListing, Occupancy},
        enrollment::{
            Enrollment, EnrollmentOutcome, EnrollmentStatus, EnrollmentView, ValidationAction,
        },
        user::Role,
    },
    services::{auth_service, course_service, user_service},
};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

const VIEW_SELECT: &str = r#"
    SELECT e.id, e.student_id, u.username AS student_name, u.email AS student_email,
           e.course_id, c.name AS course_name, e.status, e.created_at
    FROM enrollments e
    JOIN users u ON u.id = e.student_id
    JOIN courses c ON c.id = e.course_id
"#;

/// Clone created by `duplicate_course`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicatedCourse {
    pub course_id: i64,
    // Waitlist entries moved to the clone as pending
    pub migrated: u64,
}

/// Counts approved, pending and waitlisted rows of one course.
pub async fn course_occupancy<'e, E>(executor: E, capacity: i64, course_id: i64) -> AppResult<Occupancy>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let (approved, pending, waitlist): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(status = 'approved'), 0),
            COALESCE(SUM(status = 'pending'), 0),
            COALESCE(SUM(status = 'waitlist'), 0)
        FROM enrollments
        WHERE course_id = ?1
        "#,
    )
    .bind(course_id)
    .fetch_one(executor)
    .await?;

    Ok(Occupancy {
        approved,
        pending,
        waitlist,
        capacity,
    })
}

/// Occupancy of every course that has at least one enrollment.
pub async fn occupancy_by_course(db_pool: &SqlitePool, capacity: i64) -> AppResult<HashMap<i64, Occupancy>> {
    let rows: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT
            course_id,
            COALESCE(SUM(status = 'approved'), 0),
            COALESCE(SUM(status = 'pending'), 0),
            COALESCE(SUM(status = 'waitlist'), 0)
        FROM enrollments
        GROUP BY course_id
        "#,
    )
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(course_id, approved, pending, waitlist)| {
            (
                course_id,
                Occupancy {
                    approved,
                    pending,
                    waitlist,
                    capacity,
                },
            )
        })
        .collect())
}

/// Handles a student's enrollment request for a course.
///
/// * a non-waitlist row for the pair -> `DuplicateEnrollment`
/// * a waitlist row for the pair -> `AlreadyWaitlisted`, nothing written
/// * approved count below capacity -> new `pending` row
/// * otherwise -> new `waitlist` row
pub async fn request_enrollment(
    db_pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    student_id: i64,
    course_id: i64,
) -> AppResult<EnrollmentOutcome> {
    tracing::info!("Enrollment request: student {} -> course {}", student_id, course_id);
    let mut tx = db_pool.begin().await?;

    // 1. Only students enroll
    let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?;
    match role {
        Some(Role::Student) => {}
        Some(Role::Teacher) | Some(Role::Admin) => {
            tracing::warn!("User {} is not a student, enrollment refused.", student_id);
            return Err(AppError::Forbidden);
        }
        None => return Err(AppError::NotFound("Student")),
    }

    // 2. The course must exist
    let course_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?1)")
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;
    if !course_exists {
        return Err(AppError::NotFound("Course"));
    }

    // 3. One row per (student, course)
    let existing: Option<EnrollmentStatus> =
        sqlx::query_scalar("SELECT status FROM enrollments WHERE student_id = ?1 AND course_id = ?2")
            .bind(student_id)
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;
    match existing {
        Some(EnrollmentStatus::Waitlist) => {
            tracing::info!("Student {} already waitlisted for course {}.", student_id, course_id);
            return Ok(EnrollmentOutcome::AlreadyWaitlisted);
        }
        Some(status) => {
            tracing::warn!(
                "Duplicate enrollment: student {} already {} for course {}.",
                student_id,
                status,
                course_id
            );
            return Err(AppError::DuplicateEnrollment);
        }
        None => {}
    }

    // 4. Optional per-student cap on active enrollments
    if let Some(limit) = policy.student_limit {
        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments WHERE student_id = ?1 AND status IN ('pending', 'approved')",
        )
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;
        if active >= limit {
            tracing::warn!("Student {} reached the limit of {} enrollments.", student_id, limit);
            return Err(AppError::EnrollmentLimitReached(limit));
        }
    }

    // 5. Seat available? pending : waitlist
    let occupancy = course_occupancy(&mut *tx, policy.course_capacity, course_id).await?;
    let (status, outcome) = if occupancy.approved < policy.course_capacity {
        (EnrollmentStatus::Pending, EnrollmentOutcome::Pending)
    } else {
        (EnrollmentStatus::Waitlist, EnrollmentOutcome::Waitlisted)
    };

    let inserted = sqlx::query("INSERT INTO enrollments (student_id, course_id, status) VALUES (?1, ?2, ?3)")
        .bind(student_id)
        .bind(course_id)
        .bind(status)
        .execute(&mut *tx)
        .await;
    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(AppError::DuplicateEnrollment),
        Err(e) => return Err(e.into()),
    }

    tx.commit().await?;
    tracing::info!(
        "✅ Student {} -> course {}: {} ({}/{} approved)",
        student_id,
        course_id,
        status,
        occupancy.approved,
        policy.course_capacity
    );
    Ok(outcome)
}

/// Admin decision on an enrollment. Approving needs a free seat; rejecting
/// promotes waitlisted students into any seat that is now free.
pub async fn validate_enrollment(
    db_pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    enrollment_id: i64,
    action: ValidationAction,
) -> AppResult<Enrollment> {
    tracing::info!("Validating enrollment {}: {:?}", enrollment_id, action);
    let mut tx = db_pool.begin().await?;

    let enrollment = find_enrollment(&mut tx, enrollment_id)
        .await?
        .ok_or(AppError::NotFound("Enrollment"))?;
    let target = action.target_status();

    if enrollment.status == target {
        tracing::debug!("Enrollment {} already {}.", enrollment_id, target);
        return Ok(enrollment);
    }

    if action == ValidationAction::Approve {
        let occupancy = course_occupancy(&mut *tx, policy.course_capacity, enrollment.course_id).await?;
        if occupancy.is_full() {
            tracing::warn!(
                "Cannot approve enrollment {}: course {} is full.",
                enrollment_id,
                enrollment.course_id
            );
            return Err(AppError::CourseFull);
        }
    }

    set_status(&mut tx, enrollment_id, target).await?;

    match action {
        ValidationAction::Approve => {
            waitlist_pending_if_full(&mut tx, policy.course_capacity, enrollment.course_id).await?;
        }
        ValidationAction::Reject => {
            promote_in(&mut tx, policy.course_capacity, enrollment.course_id).await?;
        }
    }

    let updated = find_enrollment(&mut tx, enrollment_id)
        .await?
        .ok_or(AppError::InternalServerError)?;
    tx.commit().await?;
    tracing::info!("✅ Enrollment {} is now {}.", enrollment_id, updated.status);
    Ok(updated)
}

/// Moves the oldest waitlisted entries of a course to `pending`, one per free
/// seat. Returns how many were promoted.
pub async fn promote_waitlist(db_pool: &SqlitePool, policy: &EnrollmentPolicy, course_id: i64) -> AppResult<u64> {
    let mut tx = db_pool.begin().await?;
    let promoted = promote_in(&mut tx, policy.course_capacity, course_id).await?;
    tx.commit().await?;
    Ok(promoted)
}

/// A student drops their own enrollment. Returns the course id.
pub async fn withdraw_enrollment(
    db_pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    student_id: i64,
    enrollment_id: i64,
) -> AppResult<i64> {
    tracing::info!("Student {} withdrawing enrollment {}", student_id, enrollment_id);
    let mut tx = db_pool.begin().await?;

    // Someone else's enrollment looks the same as a missing one
    let enrollment = find_enrollment(&mut tx, enrollment_id)
        .await?
        .filter(|e| e.student_id == student_id)
        .ok_or(AppError::NotFound("Enrollment"))?;

    if enrollment.status == EnrollmentStatus::Rejected {
        return Err(AppError::Validation("Rejected enrollments cannot be withdrawn.".into()));
    }

    sqlx::query("DELETE FROM enrollments WHERE id = ?1")
        .bind(enrollment_id)
        .execute(&mut *tx)
        .await?;

    if enrollment.status == EnrollmentStatus::Approved {
        promote_in(&mut tx, policy.course_capacity, enrollment.course_id).await?;
    }

    tx.commit().await?;
    Ok(enrollment.course_id)
}

/// Fills the remaining seats of a course with generated, auto-approved
/// student accounts. Returns the number of accounts created.
pub async fn apply_mass_enrollment(
    db_pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    course_id: i64,
) -> AppResult<u64> {
    tracing::info!("Mass enrollment requested for course {}", course_id);

    // Generated accounts share one random password nobody knows
    let password_hash = auth_service::hash_password(&Uuid::new_v4().to_string()).await?;

    let mut tx = db_pool.begin().await?;

    let course_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?1)")
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;
    if !course_exists {
        return Err(AppError::NotFound("Course"));
    }

    let occupancy = course_occupancy(&mut *tx, policy.course_capacity, course_id).await?;
    let slots = occupancy.remaining();
    if slots == 0 {
        tracing::info!("Course {} is already full, nothing to fill.", course_id);
    }

    for _ in 0..slots {
        let tag = Uuid::new_v4().simple().to_string();
        let tag = &tag[..12];
        let username = format!("sim-student-{}", tag);
        let email = format!("sim-{}@mass-enrollment.invalid", tag);

        let student_id =
            user_service::insert_user(&mut *tx, &username, &email, &password_hash, Role::Student, true)
                .await?;

        sqlx::query("INSERT INTO enrollments (student_id, course_id, status) VALUES (?1, ?2, ?3)")
            .bind(student_id)
            .bind(course_id)
            .bind(EnrollmentStatus::Approved)
            .execute(&mut *tx)
            .await?;
    }
    waitlist_pending_if_full(&mut tx, policy.course_capacity, course_id).await?;

    tx.commit().await?;
    tracing::info!("✅ Course {} filled with {} generated students.", course_id, slots);
    Ok(slots as u64)
}

/// Clones a course and carries its waitlist over: every waitlisted student
/// gets a `pending` entry on the clone and leaves the original's waitlist.
pub async fn duplicate_course(db_pool: &SqlitePool, course_id: i64) -> AppResult<DuplicatedCourse> {
    tracing::info!("Duplicating course {}", course_id);
    let mut tx = db_pool.begin().await?;

    let original = sqlx::query_as::<_, Course>(
        "SELECT id, name, description, created_at, updated_at FROM courses WHERE id = ?1",
    )
    .bind(course_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Course"))?;

    let clone_id = sqlx::query("INSERT INTO courses (name, description) VALUES (?1, ?2)")
        .bind(format!("{} (copy)", original.name))
        .bind(&original.description)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    let migrated = sqlx::query(
        r#"
        INSERT INTO enrollments (student_id, course_id, status)
        SELECT student_id, ?1, 'pending'
        FROM enrollments
        WHERE course_id = ?2 AND status = 'waitlist'
        ORDER BY id ASC
        "#,
    )
    .bind(clone_id)
    .bind(course_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM enrollments WHERE course_id = ?1 AND status = 'waitlist'")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        "✅ Course {} duplicated as {} ({} waitlisted students moved).",
        course_id,
        clone_id,
        migrated
    );
    Ok(DuplicatedCourse {
        course_id: clone_id,
        migrated,
    })
}

pub async fn list_for_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<Vec<EnrollmentView>> {
    let rows = sqlx::query_as::<_, EnrollmentView>(&format!(
        "{} WHERE e.student_id = ?1 ORDER BY c.name ASC",
        VIEW_SELECT
    ))
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

pub async fn list_for_course(db_pool: &SqlitePool, course_id: i64) -> AppResult<Vec<EnrollmentView>> {
    let rows = sqlx::query_as::<_, EnrollmentView>(&format!(
        "{} WHERE e.course_id = ?1 ORDER BY e.id ASC",
        VIEW_SELECT
    ))
    .bind(course_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// Every enrollment, optionally restricted to one status. Synthetic accounts
/// are left out to keep the admin list readable.
pub async fn list_all(db_pool: &SqlitePool, status: Option<EnrollmentStatus>) -> AppResult<Vec<EnrollmentView>> {
    let rows = sqlx::query_as::<_, EnrollmentView>(&format!(
        "{} WHERE u.is_synthetic = 0 AND (?1 IS NULL OR e.status = ?1) ORDER BY c.name ASC, e.id ASC",
        VIEW_SELECT
    ))
    .bind(status)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// Requests waiting for review, as listed by `list_all`.
pub async fn count_pending(db_pool: &SqlitePool) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM enrollments e JOIN users u ON u.id = e.student_id
         WHERE e.status = 'pending' AND u.is_synthetic = 0",
    )
    .fetch_one(db_pool)
    .await?;
    Ok(count)
}

/// Course catalog with seat usage and, for a student, their own status.
pub async fn catalog(
    db_pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    student_id: Option<i64>,
) -> AppResult<Vec<CourseListing>> {
    let courses = course_service::find_all_courses(db_pool).await?;
    let occupancy = occupancy_by_course(db_pool, policy.course_capacity).await?;

    let mine: HashMap<i64, EnrollmentStatus> = match student_id {
        Some(id) => list_for_student(db_pool, id)
            .await?
            .into_iter()
            .map(|e| (e.course_id, e.status))
            .collect(),
        None => HashMap::new(),
    };

    Ok(courses
        .into_iter()
        .map(|course| CourseListing {
            occupancy: occupancy.get(&course.id).copied().unwrap_or(Occupancy {
                capacity: policy.course_capacity,
                ..Occupancy::default()
            }),
            my_status: mine.get(&course.id).map(|s| s.to_string()),
            course,
        })
        .collect())
}

async fn find_enrollment(conn: &mut SqliteConnection, enrollment_id: i64) -> AppResult<Option<Enrollment>> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        "SELECT id, student_id, course_id, status, created_at, updated_at FROM enrollments WHERE id = ?1",
    )
    .bind(enrollment_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(enrollment)
}

async fn set_status(conn: &mut SqliteConnection, enrollment_id: i64, status: EnrollmentStatus) -> AppResult<()> {
    sqlx::query("UPDATE enrollments SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2")
        .bind(status)
        .bind(enrollment_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// Once every seat is approved, open requests go back to the waitlist. They keep
// their ids, so they stay ahead of later waitlist entries.
async fn waitlist_pending_if_full(conn: &mut SqliteConnection, capacity: i64, course_id: i64) -> AppResult<u64> {
    let occupancy = course_occupancy(&mut *conn, capacity, course_id).await?;
    if !occupancy.is_full() || occupancy.pending == 0 {
        return Ok(0);
    }

    let moved = sqlx::query(
        r#"
        UPDATE enrollments
        SET status = 'waitlist', updated_at = CURRENT_TIMESTAMP
        WHERE course_id = ?1 AND status = 'pending'
        "#,
    )
    .bind(course_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    tracing::info!("Course {} is full, {} pending requests moved to the waitlist.", course_id, moved);
    Ok(moved)
}

async fn promote_in(conn: &mut SqliteConnection, capacity: i64, course_id: i64) -> AppResult<u64> {
    let occupancy = course_occupancy(&mut *conn, capacity, course_id).await?;
    // Pending requests already claim the free seats they fit in
    let free = (occupancy.remaining() - occupancy.pending).max(0);
    if free == 0 || occupancy.waitlist == 0 {
        return Ok(0);
    }

    let promoted = sqlx::query(
        r#"
        UPDATE enrollments
        SET status = 'pending', updated_at = CURRENT_TIMESTAMP
        WHERE id IN (
            SELECT id FROM enrollments
            WHERE course_id = ?1 AND status = 'waitlist'
            ORDER BY id ASC
            LIMIT ?2
        )
        "#,
    )
    .bind(course_id)
    .bind(free)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if promoted > 0 {
        tracing::info!("⬆️ Promoted {} waitlisted students in course {}.", promoted, course_id);
    }
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::TestDbBuilder;

    fn policy(capacity: i64) -> EnrollmentPolicy {
        EnrollmentPolicy {
            course_capacity: capacity,
            student_limit: None,
        }
    }

    async fn status_of(db: &crate::test::utils::TestDb, student: &str, course: &str) -> Option<EnrollmentStatus> {
        sqlx::query_scalar("SELECT status FROM enrollments WHERE student_id = ?1 AND course_id = ?2")
            .bind(db.user_id(student))
            .bind(db.course_id(course))
            .fetch_optional(&db.pool)
            .await
            .expect("status query")
    }

    #[tokio::test]
    async fn request_below_capacity_is_pending() {
        let db = TestDbBuilder::new().student("ana").course("Rust").build().await.expect("test db");

        let outcome = request_enrollment(&db.pool, &policy(2), db.user_id("ana"), db.course_id("Rust"))
            .await
            .expect("request");

        assert_eq!(outcome, EnrollmentOutcome::Pending);
        assert_eq!(status_of(&db, "ana", "Rust").await, Some(EnrollmentStatus::Pending));
    }

    #[tokio::test]
    async fn full_course_puts_student_on_waitlist() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .student("caio")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "approved")
            .build()
            .await
            .expect("test db");

        let outcome = request_enrollment(&db.pool, &policy(2), db.user_id("caio"), db.course_id("Rust"))
            .await
            .expect("request");

        assert_eq!(outcome, EnrollmentOutcome::Waitlisted);
        assert_eq!(status_of(&db, "caio", "Rust").await, Some(EnrollmentStatus::Waitlist));
    }

    #[tokio::test]
    async fn pending_requests_do_not_take_seats() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .course("Rust")
            .enrollment("ana", "Rust", "pending")
            .build()
            .await
            .expect("test db");

        let outcome = request_enrollment(&db.pool, &policy(1), db.user_id("bia"), db.course_id("Rust"))
            .await
            .expect("request");
        assert_eq!(outcome, EnrollmentOutcome::Pending);
    }

    #[tokio::test]
    async fn repeated_request_while_waitlisted_is_a_noop() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");

        let outcome = request_enrollment(&db.pool, &policy(1), db.user_id("bia"), db.course_id("Rust"))
            .await
            .expect("request");
        assert_eq!(outcome, EnrollmentOutcome::AlreadyWaitlisted);

        let rows = list_for_course(&db.pool, db.course_id("Rust")).await.expect("list");
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_request_is_rejected() {
        let db = TestDbBuilder::new().student("ana").course("Rust").build().await.expect("test db");
        let (ana, rust) = (db.user_id("ana"), db.course_id("Rust"));

        request_enrollment(&db.pool, &policy(15), ana, rust).await.expect("first request");
        let second = request_enrollment(&db.pool, &policy(15), ana, rust).await;

        assert!(matches!(second, Err(AppError::DuplicateEnrollment)));
        assert_eq!(list_for_student(&db.pool, ana).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn only_students_can_request() {
        let db = TestDbBuilder::new().teacher("tom").course("Rust").build().await.expect("test db");

        let by_teacher = request_enrollment(&db.pool, &policy(15), db.user_id("tom"), db.course_id("Rust")).await;
        assert!(matches!(by_teacher, Err(AppError::Forbidden)));

        let missing_course = request_enrollment(&db.pool, &policy(15), db.user_id("tom"), 4242).await;
        assert!(matches!(missing_course, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let db = TestDbBuilder::new().student("ana").build().await.expect("test db");

        let result = request_enrollment(&db.pool, &policy(15), db.user_id("ana"), 4242).await;
        assert!(matches!(result, Err(AppError::NotFound("Course"))));
    }

    #[tokio::test]
    async fn student_limit_is_enforced_when_configured() {
        let db = TestDbBuilder::new()
            .student("ana")
            .course("Rust")
            .course("Go")
            .enrollment("ana", "Rust", "approved")
            .build()
            .await
            .expect("test db");
        let limited = EnrollmentPolicy {
            course_capacity: 15,
            student_limit: Some(1),
        };

        let result = request_enrollment(&db.pool, &limited, db.user_id("ana"), db.course_id("Go")).await;
        assert!(matches!(result, Err(AppError::EnrollmentLimitReached(1))));

        let unlimited = request_enrollment(&db.pool, &policy(15), db.user_id("ana"), db.course_id("Go")).await;
        assert_eq!(unlimited.expect("request"), EnrollmentOutcome::Pending);
    }

    #[tokio::test]
    async fn approval_is_refused_when_course_is_full() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "pending")
            .build()
            .await
            .expect("test db");
        let bia_enrollment = db.enrollment_id("bia", "Rust").await;

        let result = validate_enrollment(&db.pool, &policy(1), bia_enrollment, ValidationAction::Approve).await;
        assert!(matches!(result, Err(AppError::CourseFull)));
        assert_eq!(status_of(&db, "bia", "Rust").await, Some(EnrollmentStatus::Pending));

        let approved = validate_enrollment(&db.pool, &policy(2), bia_enrollment, ValidationAction::Approve)
            .await
            .expect("approve with room");
        assert_eq!(approved.status, EnrollmentStatus::Approved);
    }

    #[tokio::test]
    async fn rejecting_an_approved_seat_promotes_the_oldest_waitlisted() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .student("caio")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "waitlist")
            .enrollment("caio", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");
        let ana_enrollment = db.enrollment_id("ana", "Rust").await;

        let rejected = validate_enrollment(&db.pool, &policy(1), ana_enrollment, ValidationAction::Reject)
            .await
            .expect("reject");

        assert_eq!(rejected.status, EnrollmentStatus::Rejected);
        assert_eq!(status_of(&db, "bia", "Rust").await, Some(EnrollmentStatus::Pending));
        assert_eq!(status_of(&db, "caio", "Rust").await, Some(EnrollmentStatus::Waitlist));
    }

    #[tokio::test]
    async fn filling_the_last_seat_sends_pending_requests_to_the_waitlist() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .student("caio")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "pending")
            .enrollment("caio", "Rust", "pending")
            .build()
            .await
            .expect("test db");
        let bia_enrollment = db.enrollment_id("bia", "Rust").await;

        validate_enrollment(&db.pool, &policy(2), bia_enrollment, ValidationAction::Approve)
            .await
            .expect("approve last seat");

        assert_eq!(status_of(&db, "caio", "Rust").await, Some(EnrollmentStatus::Waitlist));
    }

    #[tokio::test]
    async fn mass_enrollment_keeps_earlier_requests_first_in_line() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .course("Rust")
            .enrollment("ana", "Rust", "pending")
            .build()
            .await
            .expect("test db");
        let rust = db.course_id("Rust");
        let ana_enrollment = db.enrollment_id("ana", "Rust").await;

        assert_eq!(apply_mass_enrollment(&db.pool, &policy(2), rust).await.expect("mass enroll"), 2);
        assert_eq!(status_of(&db, "ana", "Rust").await, Some(EnrollmentStatus::Waitlist));

        let outcome = request_enrollment(&db.pool, &policy(2), db.user_id("bia"), rust)
            .await
            .expect("request");
        assert_eq!(outcome, EnrollmentOutcome::Waitlisted);

        let generated: i64 = sqlx::query_scalar(
            r#"
            SELECT e.id FROM enrollments e JOIN users u ON u.id = e.student_id
            WHERE e.course_id = ?1 AND u.is_synthetic = 1
            ORDER BY e.id LIMIT 1
            "#,
        )
        .bind(rust)
        .fetch_one(&db.pool)
        .await
        .expect("generated seat");
        validate_enrollment(&db.pool, &policy(2), generated, ValidationAction::Reject)
            .await
            .expect("free a seat");

        let occupancy = course_occupancy(&db.pool, 2, rust).await.expect("occupancy");
        assert_eq!((occupancy.approved, occupancy.pending, occupancy.waitlist), (1, 1, 1));
        assert_eq!(status_of(&db, "ana", "Rust").await, Some(EnrollmentStatus::Pending));
        assert_eq!(status_of(&db, "bia", "Rust").await, Some(EnrollmentStatus::Waitlist));

        let approved = validate_enrollment(&db.pool, &policy(2), ana_enrollment, ValidationAction::Approve)
            .await
            .expect("approve ana");
        assert_eq!(approved.status, EnrollmentStatus::Approved);
    }

    #[tokio::test]
    async fn promotion_leaves_seats_claimed_by_pending_requests() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .course("Rust")
            .enrollment("ana", "Rust", "pending")
            .enrollment("bia", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");

        let promoted = promote_waitlist(&db.pool, &policy(1), db.course_id("Rust")).await.expect("promote");

        assert_eq!(promoted, 0);
        assert_eq!(status_of(&db, "bia", "Rust").await, Some(EnrollmentStatus::Waitlist));
    }

    #[tokio::test]
    async fn pending_count_matches_the_review_list() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .student("caio")
            .course("Rust")
            .course("Go")
            .enrollment("ana", "Rust", "pending")
            .enrollment("bia", "Rust", "pending")
            .enrollment("caio", "Rust", "approved")
            .build()
            .await
            .expect("test db");

        apply_mass_enrollment(&db.pool, &policy(2), db.course_id("Go")).await.expect("mass");
        sqlx::query(
            "UPDATE enrollments SET status = 'pending'
             WHERE student_id IN (SELECT id FROM users WHERE is_synthetic = 1)",
        )
        .execute(&db.pool)
        .await
        .expect("synthetic rows");

        let listed = list_all(&db.pool, Some(EnrollmentStatus::Pending)).await.expect("list");
        assert_eq!(count_pending(&db.pool).await.expect("count"), 2);
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn validating_a_missing_enrollment_is_not_found() {
        let db = TestDbBuilder::new().build().await.expect("test db");
        let result = validate_enrollment(&db.pool, &policy(15), 99, ValidationAction::Approve).await;
        assert!(matches!(result, Err(AppError::NotFound("Enrollment"))));
    }

    #[tokio::test]
    async fn promote_waitlist_fills_only_free_seats() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .student("caio")
            .student("duda")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "waitlist")
            .enrollment("caio", "Rust", "waitlist")
            .enrollment("duda", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");

        let promoted = promote_waitlist(&db.pool, &policy(3), db.course_id("Rust")).await.expect("promote");

        assert_eq!(promoted, 2);
        assert_eq!(status_of(&db, "bia", "Rust").await, Some(EnrollmentStatus::Pending));
        assert_eq!(status_of(&db, "caio", "Rust").await, Some(EnrollmentStatus::Pending));
        assert_eq!(status_of(&db, "duda", "Rust").await, Some(EnrollmentStatus::Waitlist));
    }

    #[tokio::test]
    async fn withdrawing_an_approved_seat_promotes() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");
        let ana_enrollment = db.enrollment_id("ana", "Rust").await;

        let not_owner = withdraw_enrollment(&db.pool, &policy(1), db.user_id("bia"), ana_enrollment).await;
        assert!(matches!(not_owner, Err(AppError::NotFound(_))));

        let course = withdraw_enrollment(&db.pool, &policy(1), db.user_id("ana"), ana_enrollment)
            .await
            .expect("withdraw");
        assert_eq!(course, db.course_id("Rust"));
        assert_eq!(status_of(&db, "ana", "Rust").await, None);
        assert_eq!(status_of(&db, "bia", "Rust").await, Some(EnrollmentStatus::Pending));
    }

    #[tokio::test]
    async fn mass_enrollment_never_exceeds_capacity() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .student("caio")
            .student("duda")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "approved")
            .enrollment("caio", "Rust", "approved")
            .enrollment("duda", "Rust", "pending")
            .build()
            .await
            .expect("test db");
        let rust = db.course_id("Rust");
        let policy = EnrollmentPolicy::default();

        let created = apply_mass_enrollment(&db.pool, &policy, rust).await.expect("mass enroll");
        assert_eq!(created, 12);

        let occupancy = course_occupancy(&db.pool, policy.course_capacity, rust).await.expect("occupancy");
        assert_eq!(occupancy.approved, 15);
        assert_eq!(occupancy.pending, 0);
        assert_eq!(status_of(&db, "duda", "Rust").await, Some(EnrollmentStatus::Waitlist));

        let again = apply_mass_enrollment(&db.pool, &policy, rust).await.expect("second run");
        assert_eq!(again, 0);

        let synthetic: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_synthetic = 1")
            .fetch_one(&db.pool)
            .await
            .expect("count");
        assert_eq!(synthetic, 12);

        // Generated students stay out of the admin list
        assert_eq!(list_all(&db.pool, None).await.expect("list").len(), 4);
    }

    #[tokio::test]
    async fn mass_enrollment_on_missing_course_is_not_found() {
        let db = TestDbBuilder::new().build().await.expect("test db");
        let result = apply_mass_enrollment(&db.pool, &EnrollmentPolicy::default(), 7).await;
        assert!(matches!(result, Err(AppError::NotFound("Course"))));
    }

    #[tokio::test]
    async fn duplicate_course_moves_the_waitlist() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .student("caio")
            .course("Rust")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "waitlist")
            .enrollment("caio", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");
        let rust = db.course_id("Rust");

        let clone = duplicate_course(&db.pool, rust).await.expect("duplicate");
        assert_eq!(clone.migrated, 2);

        let original = course_occupancy(&db.pool, 1, rust).await.expect("occupancy");
        assert_eq!(original.waitlist, 0);
        assert_eq!(original.approved, 1);

        let copied = list_for_course(&db.pool, clone.course_id).await.expect("list");
        assert_eq!(copied.len(), 2);
        assert!(copied.iter().all(|e| e.status == EnrollmentStatus::Pending));
        assert_eq!(copied[0].student_name, "bia");
        assert_eq!(copied[0].course_name, "Rust (copy)");
    }

    #[tokio::test]
    async fn catalog_reports_seats_and_own_status() {
        let db = TestDbBuilder::new()
            .student("ana")
            .course("Go")
            .course("Rust")
            .enrollment("ana", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");

        let listings = catalog(&db.pool, &policy(2), Some(db.user_id("ana"))).await.expect("catalog");

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].course.name, "Go");
        assert_eq!(listings[0].occupancy.remaining(), 2);
        assert_eq!(listings[0].my_status, None);
        assert_eq!(listings[1].occupancy.waitlist, 1);
        assert_eq!(listings[1].my_status.as_deref(), Some("waitlist"));
    }
}
