// src/web/flash.rs
//
// One-shot messages carried across a redirect in the session.
use crate::error::{AppError, AppResult};
use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

impl FlashKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashKind::Success => "flash-success",
            FlashKind::Info => "flash-info",
            FlashKind::Error => "flash-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Stores a message to show on the next rendered page.
pub async fn set(session: &Session, kind: FlashKind, message: &str) -> AppResult<()> {
    let flash = Flash {
        kind,
        message: message.to_string(),
    };
    session
        .insert(FLASH_KEY, flash)
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to store flash message: {}", e)))
}

/// Reads and clears the pending message, if any.
pub async fn take(session: &Session) -> AppResult<Option<Flash>> {
    session
        .remove::<Flash>(FLASH_KEY)
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to read flash message: {}", e)))
}

/// Post/Redirect/Get helper: flash a message, then redirect.
pub async fn redirect(session: &Session, kind: FlashKind, message: &str, to: &str) -> AppResult<Redirect> {
    set(session, kind, message).await?;
    Ok(Redirect::to(to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn message_is_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        set(&session, FlashKind::Error, "Course duplicated; 3% of seats, \"quoted\" & more")
            .await
            .expect("set");

        let flash = take(&session).await.expect("take").expect("message present");
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.message, "Course duplicated; 3% of seats, \"quoted\" & more");
        assert_eq!(take(&session).await.expect("take"), None);
    }
}
