use crate::db::run_migrations;
use crate::error::AppError;
use crate::models::user::Role;
use crate::services::{course_service, user_service};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();
pub const STANDARD_PASSWORD: &str = "password123";

struct TestUser {
    name: String,
    role: Role,
}

struct TestEnrollment {
    student: String,
    course: String,
    status: String,
}

/// Declarative fixture: users get `<name>@example.com` and `STANDARD_PASSWORD`.
#[derive(Default)]
pub struct TestDbBuilder {
    users: Vec<TestUser>,
    courses: Vec<String>,
    enrollments: Vec<TestEnrollment>,
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn user(mut self, name: &str, role: Role) -> Self {
        self.users.push(TestUser {
            name: name.to_string(),
            role,
        });
        self
    }

    pub fn student(self, name: &str) -> Self {
        self.user(name, Role::Student)
    }

    pub fn teacher(self, name: &str) -> Self {
        self.user(name, Role::Teacher)
    }

    pub fn admin(self, name: &str) -> Self {
        self.user(name, Role::Admin)
    }

    pub fn course(mut self, name: &str) -> Self {
        self.courses.push(name.to_string());
        self
    }

    /// Rows are inserted in call order, so earlier calls get lower ids.
    pub fn enrollment(mut self, student: &str, course: &str, status: &str) -> Self {
        self.enrollments.push(TestEnrollment {
            student: student.to_string(),
            course: course.to_string(),
            status: status.to_string(),
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("course_portal=debug")
                .with_test_writer()
                .try_init();
        });

        // A single connection keeps every query on the same in-memory database
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        run_migrations(&pool).await?;

        let mut users = HashMap::new();
        for user in &self.users {
            let email = format!("{}@example.com", user.name);
            let id = user_service::create_user(&pool, &user.name, &email, STANDARD_PASSWORD, user.role).await?;
            users.insert(user.name.clone(), id);
        }

        let mut courses = HashMap::new();
        for name in &self.courses {
            let description = format!("All about {}.", name);
            let id = course_service::create_course(&pool, name, &description).await?;
            courses.insert(name.clone(), id);
        }

        for e in &self.enrollments {
            let student_id = users
                .get(&e.student)
                .copied()
                .ok_or_else(|| AppError::ConfigError(format!("unknown test student '{}'", e.student)))?;
            let course_id = courses
                .get(&e.course)
                .copied()
                .ok_or_else(|| AppError::ConfigError(format!("unknown test course '{}'", e.course)))?;

            sqlx::query("INSERT INTO enrollments (student_id, course_id, status) VALUES (?1, ?2, ?3)")
                .bind(student_id)
                .bind(course_id)
                .bind(&e.status)
                .execute(&pool)
                .await?;
        }

        Ok(TestDb { pool, users, courses })
    }
}

pub struct TestDb {
    pub pool: SqlitePool,
    users: HashMap<String, i64>,
    courses: HashMap<String, i64>,
}

impl TestDb {
    pub fn user_id(&self, name: &str) -> i64 {
        self.users[name]
    }

    pub fn course_id(&self, name: &str) -> i64 {
        self.courses[name]
    }

    pub async fn enrollment_id(&self, student: &str, course: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM enrollments WHERE student_id = ?1 AND course_id = ?2")
            .bind(self.user_id(student))
            .bind(self.course_id(course))
            .fetch_one(&self.pool)
            .await
            .expect("enrollment exists")
    }
}
