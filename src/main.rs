//! Fundo Verde API Server
//!
//! # Startup
//!
//! 1. `.env` → `Config::from_env`
//! 2. `DB_STATUS=online`: 연결 → `migrations/` 적용 → 만료 세션 정리 → 관리자 bootstrap
//!    `DB_STATUS=offline`: lazy 풀만 생성, 카탈로그는 정적 데이터로 응답
//! 3. `UPLOAD_DIR` 생성 후 `0.0.0.0:PORT`에서 서빙
//!
//! 로그 레벨은 `RUST_LOG`로 조정 (예: `RUST_LOG=fundo_verde_api=info,sqlx=warn`)

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundo_verde_api::{
    routes::create_router, services::sessions, AppState, Config, Database,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fundo_verde_api=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🌱 Starting Fundo Verde API Server");

    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded ({:?})", config.environment);

    let db = if config.use_static_fallback() {
        tracing::warn!("⚠️  DB_STATUS offline: serving static SDG / project catalogue");
        Database::connect_lazy(&config.database_url)?
    } else {
        let db = Database::connect(&config.database_url).await?;
        tracing::info!("🗄️  Connected to PostgreSQL");
        db.run_migrations().await?;
        tracing::info!("📦 Schema up to date");

        bootstrap(&db, &config).await?;
        db
    };

    sessions::dummy_hash().await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!("📁 Uploads stored in {}", config.upload_dir.display());

    let port = config.port;
    let app = create_router(AppState::new(db, config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🌐 Fundo Verde API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 만료 세션 정리 + 관리자 계정 생성 (ADMIN_EMAIL / ADMIN_PASSWORD)
async fn bootstrap(db: &Database, config: &Config) -> anyhow::Result<()> {
    let purged = db.purge_expired_sessions().await?;
    if purged > 0 {
        tracing::info!("🧹 Removed {} expired sessions", purged);
    }

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let hash = sessions::hash_password(password.clone()).await?;
        if let Some(id) = db.ensure_admin(email, &hash).await? {
            tracing::info!("👤 Admin account created (user id {})", id);
            if id != config.admin_user_id {
                tracing::warn!(
                    "ADMIN_USER_ID is {} but the admin account has id {}",
                    config.admin_user_id,
                    id
                );
            }
        }
    }

    Ok(())
}
