// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod course_handlers;
pub mod enrollment_handlers;
pub mod flash;
pub mod mw_admin;
pub mod mw_auth;
pub mod payment_handlers;
pub mod report_handlers;
pub mod routes;
pub mod user_handlers;

/// Flattens validator errors into user-facing messages, sorted for a stable
/// display order.
pub fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}.", field))
            })
        })
        .collect();
    messages.sort();
    messages
}
