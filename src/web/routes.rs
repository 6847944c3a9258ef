// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        admin_handlers, auth_handlers, course_handlers, enrollment_handlers, mw_admin, mw_auth, payment_handlers,
        report_handlers, user_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::Key, Expiry, SessionManagerLayer, SessionStore};

pub fn create_router(app_state: AppState) -> Router {
    // --- Public ---
    let public_routes = Router::new()
        .route("/", get(auth_handlers::index))
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout))
        .route(
            "/register/student",
            get(auth_handlers::show_register_student).post(auth_handlers::handle_register_student),
        )
        .route(
            "/register/teacher",
            get(auth_handlers::show_register_teacher).post(auth_handlers::handle_register_teacher),
        );

    // --- Admin (require_auth is applied by the parent router) ---
    let admin_routes = Router::new()
        .route(
            "/courses/new",
            get(course_handlers::show_create_form).post(course_handlers::handle_create),
        )
        .route(
            "/courses/{id}/edit",
            get(course_handlers::show_edit_form).post(course_handlers::handle_edit),
        )
        .route("/courses/{id}/delete", post(course_handlers::handle_delete))
        .route("/courses/{id}/duplicate", post(course_handlers::handle_duplicate))
        .route("/courses/{id}/mass-enroll", post(course_handlers::handle_mass_enroll))
        .route("/enrollments", get(enrollment_handlers::show_enrollments))
        .route("/enrollments/{id}/{action}", post(enrollment_handlers::handle_validate))
        .route("/users", get(admin_handlers::show_users))
        .route("/users/{id}/role", post(admin_handlers::handle_set_role))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_admin::require_admin));

    // --- Staff: teachers and admins ---
    let staff_routes = Router::new()
        .route("/staff/payments", get(payment_handlers::show_staff_payments))
        .route("/staff/payments/{id}/{action}", post(payment_handlers::handle_review))
        .route("/reports", get(report_handlers::show_report))
        .route("/reports.json", get(report_handlers::report_json))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_admin::require_staff));

    // --- Any logged-in user ---
    let authenticated_routes = Router::new()
        .route("/dashboard", get(user_handlers::dashboard))
        .route("/profile", get(user_handlers::show_profile).post(user_handlers::handle_update_profile))
        .route("/courses", get(course_handlers::list_courses))
        .route("/courses/{id}/enroll", post(enrollment_handlers::handle_enroll))
        .route("/enrollments/{id}/withdraw", post(enrollment_handlers::handle_withdraw))
        .route(
            "/payments",
            get(payment_handlers::show_payments).post(payment_handlers::handle_submit_payment),
        )
        .merge(staff_routes)
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_auth::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}

/// Router plus the tracing and session layers. `key` signs the session cookie.
pub fn create_app<S>(app_state: AppState, session_store: S, key: Key) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)))
        .with_signed(key);

    create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(session_layer),
    )
}
