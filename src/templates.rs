// src/templates.rs
use crate::{
    error::AppResult,
    models::{
        course::CourseListing,
        enrollment::EnrollmentView,
        payment::PaymentView,
        user::{Role, User},
    },
    services::report_service::Report,
    web::{flash::Flash, mw_auth::CurrentUser},
};
use askama::Template;
use axum::response::Html;

/// Navigation data shared by every page (the logged-in user, if any).
#[derive(Clone, Debug)]
pub struct Nav {
    pub username: String,
    pub role: Role,
}

impl Nav {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

impl From<&CurrentUser> for Nav {
    fn from(current: &CurrentUser) -> Self {
        Nav {
            username: current.username.clone(),
            role: current.role,
        }
    }
}

/// Renders a template into an HTML response.
pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Failed to render template: {}", e);
        e.into()
    })
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    // Error message for a failed attempt
    pub error: Option<String>,
    pub email: String,
}

/// Public registration form, one per self-service role.
#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub role_label: &'static str,
    pub action: &'static str,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub user_name: String,
    pub role_label: &'static str,
    pub is_student: bool,
    pub is_admin: bool,
    pub is_staff: bool,
    pub enrollments: Vec<EnrollmentView>,
    pub payments: Vec<PaymentView>,
    pub pending_enrollments: i64,
    pub pending_payments: i64,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "courses.html")]
pub struct CoursesPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub courses: Vec<CourseListing>,
    pub is_student: bool,
    pub is_admin: bool,
}

/// Create and edit form for a course. On edit, also lists the roster.
#[derive(Template)]
#[template(path = "course_form.html")]
pub struct CourseFormPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub title: String,
    pub action: String,
    pub errors: Vec<String>,
    pub name: String,
    pub description: String,
    pub roster: Vec<EnrollmentView>,
    pub is_edit: bool,
}

#[derive(Template)]
#[template(path = "admin_enrollments.html")]
pub struct AdminEnrollmentsPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub enrollments: Vec<EnrollmentView>,
    // "" means every status
    pub filter: String,
}

#[derive(Template)]
#[template(path = "payments.html")]
pub struct PaymentsPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub payments: Vec<PaymentView>,
    pub can_submit: bool,
}

#[derive(Template)]
#[template(path = "staff_payments.html")]
pub struct StaffPaymentsPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub payments: Vec<PaymentView>,
}

#[derive(Template)]
#[template(path = "reports.html")]
pub struct ReportPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub report: Report,
}

// One row of the admin user list
#[derive(Clone, Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserRow {
    fn from(user: User) -> Self {
        UserRow {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

impl UserRow {
    pub fn has_role(&self, role: &Role) -> bool {
        self.role == *role
    }
}

#[derive(Template)]
#[template(path = "admin_users.html")]
pub struct AdminUsersPage {
    pub nav: Option<Nav>,
    pub flash: Option<Flash>,
    pub users: Vec<UserRow>,
    pub all_roles: &'static [Role],
}
