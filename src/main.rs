// src/main.rs

// --- Modules ---
mod bootstrap;
mod config;
mod db;
mod error;
mod models;
mod services;
mod state;
mod templates;
mod web;

#[cfg(test)]
mod test;

// --- Imports ---
use crate::{config::AppConfig, state::AppState};
use axum::serve;
use tokio::net::TcpListener;
use tower_sessions::{cookie::Key, ExpiredDeletion};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "course_portal=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Starting course portal...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Invalid configuration: {}", e);
            return Err(anyhow::anyhow!("Failed to load configuration: {}", e));
        }
    };
    tracing::info!(
        "📋 Course capacity {}, per-student limit {:?}.",
        config.policy.course_capacity,
        config.policy.student_limit
    );

    // --- Database ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Database initialisation failed: {}", e);
            return Err(anyhow::anyhow!("Failed to connect/migrate DB: {}", e));
        }
    };

    bootstrap::ensure_admin(&db_pool, config.admin_seed.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!("Admin bootstrap failed: {}", e))?;

    // --- Sessions ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Failed to create session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create session table: {}", e))?;

    let cleanup_store = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = cleanup_store
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Session cleanup task failed: {:?}", e);
        }
    });
    tracing::info!("🧹 Session cleanup task started.");

    let session_key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("SESSION_SECRET must be at least 64 bytes long: {}", e))?;

    let app_state = AppState {
        db_pool,
        policy: config.policy,
    };

    // --- Listener ---
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Could not bind {}: {}", config.bind_addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Listening on http://{}", config.bind_addr);

    let app = web::routes::create_app(app_state, session_store, session_key);

    tracing::info!("👂 Ready to accept connections...");
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
