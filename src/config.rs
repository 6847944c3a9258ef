// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr, str::FromStr};

/// Approved seats per course unless COURSE_CAPACITY says otherwise.
pub const DEFAULT_COURSE_CAPACITY: i64 = 15;

/// Capacity rules applied by the enrollment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentPolicy {
    pub course_capacity: i64,
    // Maximum pending + approved enrollments per student (None = unlimited)
    pub student_limit: Option<i64>,
}

impl Default for EnrollmentPolicy {
    fn default() -> Self {
        Self {
            course_capacity: DEFAULT_COURSE_CAPACITY,
            student_limit: None,
        }
    }
}

/// Credentials for the administrator created by the startup bootstrap.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub session_secret: String,
    pub bind_addr: SocketAddr,
    pub policy: EnrollmentPolicy,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    /// Reads the configuration from the environment (and `.env`, if present).
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let session_secret = env::var("SESSION_SECRET")?;

        let bind_addr = parse_var("BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let course_capacity = parse_var::<i64>("COURSE_CAPACITY")?.unwrap_or(DEFAULT_COURSE_CAPACITY);
        if course_capacity < 1 {
            return Err(AppError::ConfigError("COURSE_CAPACITY must be at least 1".into()));
        }

        let student_limit = parse_var::<i64>("STUDENT_ENROLLMENT_LIMIT")?;
        if matches!(student_limit, Some(limit) if limit < 1) {
            return Err(AppError::ConfigError(
                "STUDENT_ENROLLMENT_LIMIT must be at least 1 when set".into(),
            ));
        }

        let admin_seed = match (non_empty_var("ADMIN_EMAIL"), non_empty_var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                username: non_empty_var("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::ConfigError(
                    "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".into(),
                ))
            }
        };

        Ok(Self {
            database_url,
            session_secret,
            bind_addr,
            policy: EnrollmentPolicy {
                course_capacity,
                student_limit,
            },
            admin_seed,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> AppResult<Option<T>> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::ConfigError(format!("{} has an invalid value: '{}'", name, raw))),
        None => Ok(None),
    }
}
