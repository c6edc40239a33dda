//! Health Check Endpoint
//!
//! # Interview Q&A
//!
//! Q: DB가 죽어 있는데 왜 200을 반환하는가?
//! A: 카탈로그는 정적 데이터로 계속 서비스 가능하기 때문
//!    - `status: degraded` + `database.connected: false`로 상태만 알림
//!    - 오케스트레이터는 body를 보고 판단
//!
//! Q: `catalogue` 필드는?
//! A: `DB_STATUS` 플래그 반영 (`database` | `static`)

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseStatus,
    /// ODS / 프로젝트 데이터 출처
    pub catalogue: &'static str,
    pub uploads_dir_present: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let started = std::time::Instant::now();
    let database = match state.db.ping().await {
        Ok(()) => DatabaseStatus {
            connected: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!("Health check: database unreachable: {}", e);
            DatabaseStatus {
                connected: false,
                latency_ms: None,
            }
        }
    };

    let uploads_dir_present = tokio::fs::metadata(state.uploads.root())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    Json(HealthResponse {
        status: if database.connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        catalogue: if state.config.use_static_fallback() { "static" } else { "database" },
        uploads_dir_present,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
