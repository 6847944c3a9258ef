// src/models/enrollment.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
    Waitlist,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
            EnrollmentStatus::Waitlist => "waitlist",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub status: EnrollmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Enrollment joined with the student and course names, for listings.
#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentView {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub course_id: i64,
    pub course_name: String,
    pub status: EnrollmentStatus,
    pub created_at: NaiveDateTime,
}

impl EnrollmentView {
    pub fn is_pending(&self) -> bool {
        self.status == EnrollmentStatus::Pending
    }

    pub fn is_waitlisted(&self) -> bool {
        self.status == EnrollmentStatus::Waitlist
    }

    pub fn can_withdraw(&self) -> bool {
        self.status != EnrollmentStatus::Rejected
    }
}

/// Result of a successful `request_enrollment` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// A seat is available; the request waits for admin validation.
    Pending,
    /// The course is full; the student joined the waitlist.
    Waitlisted,
    /// The student was already on the waitlist; nothing changed.
    AlreadyWaitlisted,
}

/// Admin decision on a pending enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationAction {
    Approve,
    Reject,
}

impl ValidationAction {
    pub fn target_status(&self) -> EnrollmentStatus {
        match self {
            ValidationAction::Approve => EnrollmentStatus::Approved,
            ValidationAction::Reject => EnrollmentStatus::Rejected,
        }
    }
}
