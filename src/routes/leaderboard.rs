//! Carbon Leaderboard Endpoint

use axum::{extract::State, Json};

use crate::{
    auth::CurrentUser,
    error::ApiError,
    services::footprint::{rank_leaderboard, LeaderboardEntry},
    AppState,
};

/// GET /api/carbon-leaderboard
///
/// 배출 대비 보상 비율이 높은 회사 순
pub async fn carbon_leaderboard(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let rows = state.db.company_footprints().await?;
    Ok(Json(rank_leaderboard(rows)))
}
