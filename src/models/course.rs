// src/models/course.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

// Create/edit form for the admin course pages
#[derive(Debug, Deserialize, Validate)]
pub struct CourseForm {
    #[validate(length(min = 1, max = 120, message = "Course name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
}

/// Seat usage of a course, as counted by the enrollment engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub approved: i64,
    pub pending: i64,
    pub waitlist: i64,
    pub capacity: i64,
}

impl Occupancy {
    pub fn remaining(&self) -> i64 {
        (self.capacity - self.approved).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }
}

/// Course row plus occupancy, for the catalog page.
#[derive(Debug, Clone)]
pub struct CourseListing {
    pub course: Course,
    pub occupancy: Occupancy,
    // Status of the viewing student's own enrollment, if any
    pub my_status: Option<String>,
}
