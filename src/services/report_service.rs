// src/services/report_service.rs
use crate::{
    config::EnrollmentPolicy,
    error::AppResult,
    models::{course::Occupancy, payment::format_cents},
    services::{course_service, enrollment_service},
};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize)]
pub struct CourseReport {
    pub course_id: i64,
    pub name: String,
    pub approved: i64,
    pub pending: i64,
    pub waitlist: i64,
    pub remaining: i64,
    pub capacity: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentTotals {
    pub approved_cents: i64,
    pub pending_count: i64,
    pub rejected_count: i64,
}

impl PaymentTotals {
    pub fn approved_amount(&self) -> String {
        format_cents(self.approved_cents)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub courses: Vec<CourseReport>,
    pub payments: PaymentTotals,
}

/// Staff overview: seat usage per course and payment totals.
pub async fn build_report(db_pool: &SqlitePool, policy: &EnrollmentPolicy) -> AppResult<Report> {
    tracing::debug!("Building staff report...");
    let courses = course_service::find_all_courses(db_pool).await?;
    let occupancy = enrollment_service::occupancy_by_course(db_pool, policy.course_capacity).await?;

    let courses = courses
        .into_iter()
        .map(|course| {
            let o = occupancy.get(&course.id).copied().unwrap_or(Occupancy {
                capacity: policy.course_capacity,
                ..Occupancy::default()
            });
            CourseReport {
                course_id: course.id,
                name: course.name,
                approved: o.approved,
                pending: o.pending,
                waitlist: o.waitlist,
                remaining: o.remaining(),
                capacity: o.capacity,
            }
        })
        .collect();

    let (approved_cents, pending_count, rejected_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN status = 'approved' THEN amount_cents END), 0),
            COALESCE(SUM(status = 'pending'), 0),
            COALESCE(SUM(status = 'rejected'), 0)
        FROM payments
        "#,
    )
    .fetch_one(db_pool)
    .await?;

    Ok(Report {
        courses,
        payments: PaymentTotals {
            approved_cents,
            pending_count,
            rejected_count,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payment_service;
    use crate::test::utils::TestDbBuilder;

    #[tokio::test]
    async fn report_counts_seats_and_payments() {
        let db = TestDbBuilder::new()
            .student("ana")
            .student("bia")
            .admin("root")
            .course("Rust")
            .course("Zig")
            .enrollment("ana", "Rust", "approved")
            .enrollment("bia", "Rust", "waitlist")
            .build()
            .await
            .expect("test db");
        let ana = db.user_id("ana");
        let root = db.user_id("root");

        let p1 = payment_service::submit_payment(&db.pool, ana, 1_000).await.expect("submit");
        let p2 = payment_service::submit_payment(&db.pool, ana, 250).await.expect("submit");
        payment_service::submit_payment(&db.pool, ana, 999).await.expect("submit");
        payment_service::review_payment(&db.pool, p1, true, root).await.expect("approve");
        payment_service::review_payment(&db.pool, p2, false, root).await.expect("reject");

        let policy = EnrollmentPolicy {
            course_capacity: 1,
            student_limit: None,
        };
        let report = build_report(&db.pool, &policy).await.expect("report");

        assert_eq!(report.courses.len(), 2);
        let rust = &report.courses[0];
        assert_eq!((rust.approved, rust.waitlist, rust.remaining), (1, 1, 0));
        let zig = &report.courses[1];
        assert_eq!((zig.approved, zig.remaining), (0, 1));

        assert_eq!(report.payments.approved_amount(), "10.00");
        assert_eq!(report.payments.pending_count, 1);
        assert_eq!(report.payments.rejected_count, 1);
    }
}
