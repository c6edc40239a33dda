//! Catalogue Endpoints
//!
//! # Interview Q&A
//!
//! Q: DB가 내려가 있으면 카탈로그는 어떻게 되는가?
//! A: `DB_STATUS=offline`이면 DB를 조회하지 않고 정적 데이터로 응답
//!    - 대상: `/api/sdgs`, `/api/projects` 두 개뿐
//!    - 정적 프로젝트의 `total_invested`는 항상 0

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{Project, Sdg},
    error::ApiError,
    services::static_data,
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub sdg_id: Option<i64>,
}

/// ODS 상세 + 관련 프로젝트
#[derive(Debug, Serialize)]
pub struct SdgDetailResponse {
    #[serde(flatten)]
    pub sdg: Sdg,
    pub projects: Vec<Project>,
}

// ============ Handlers ============

/// GET /api/sdgs
pub async fn list_sdgs(State(state): State<AppState>) -> Result<Json<Vec<Sdg>>, ApiError> {
    if state.config.use_static_fallback() {
        tracing::debug!("DB_STATUS offline, serving static SDGs");
        return Ok(Json(static_data::sdgs()));
    }

    Ok(Json(state.db.list_sdgs().await?))
}

/// GET /api/sdgs/:id
pub async fn get_sdg(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SdgDetailResponse>, ApiError> {
    if state.config.use_static_fallback() {
        let sdg = static_data::sdgs()
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("SDG {}", id)))?;
        return Ok(Json(SdgDetailResponse {
            sdg,
            projects: static_data::projects(Some(id)),
        }));
    }

    let sdg = state
        .db
        .sdg_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("SDG {}", id)))?;
    let projects = state.db.list_projects(Some(id)).await?;

    Ok(Json(SdgDetailResponse { sdg, projects }))
}

/// GET /api/projects?sdg_id=
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    if state.config.use_static_fallback() {
        tracing::debug!("DB_STATUS offline, serving static projects");
        return Ok(Json(static_data::projects(query.sdg_id)));
    }

    Ok(Json(state.db.list_projects(query.sdg_id).await?))
}
