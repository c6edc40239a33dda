//! Fundo Verde API Library
//!
//! # Overview
//!
//! 회사 / 개인의 탄소 배출 보상 결제를 받아 ODS(지속가능발전목표) 프로젝트에
//! 투자로 배분하고, 진행 상황을 대시보드로 보여주는 백엔드 API.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP ──▶ routes ──▶ auth::CurrentUser (fv_session → sessions)
//!              │
//!              ├──▶ services (pure logic, repository traits)
//!              │      sdg_targets · conversations · footprint
//!              │      smart_image · uploads · static_data
//!              │
//!              └──▶ db::Database (sqlx, PgPool) ──▶ PostgreSQL
//!
//!   /uploads/* ──▶ ServeDir(UPLOAD_DIR)
//! ```
//!
//! ## Embedding
//!
//! 통합 테스트는 DB 없이 라우터만 구성해서 `oneshot`으로 호출함:
//!
//! ```rust,ignore
//! let db = Database::connect_lazy("postgres://127.0.0.1:1/fundo_verde")?;
//! let app = create_router(AppState::new(db, Config::default())?);
//! let response = app.oneshot(request).await?;
//! ```

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

pub use config::Config;
pub use db::Database;
pub use error::ApiError;

use services::{DefaultProbe, HttpProbe, SmartImageResolver, UploadStore, UploadsProbe};

/// 핸들러가 공유하는 상태 (clone은 Arc 복사뿐)
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub uploads: Arc<UploadStore>,
    pub images: Arc<SmartImageResolver<DefaultProbe>>,
}

impl AppState {
    /// 설정으로부터 업로드 저장소 / 이미지 resolver 구성
    pub fn new(db: Database, config: Config) -> anyhow::Result<Self> {
        let probe = DefaultProbe::new(
            HttpProbe::new()?,
            UploadsProbe::new(config.upload_dir.clone()),
            config.image_allowed_hosts.clone(),
        );

        Ok(Self {
            db: Arc::new(db),
            uploads: Arc::new(UploadStore::new(config.upload_dir.clone())),
            images: Arc::new(SmartImageResolver::new(probe, config.image_probe_timeout)),
            config: Arc::new(config),
        })
    }
}
