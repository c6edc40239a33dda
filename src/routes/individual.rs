//! Individual Endpoints

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    db::{Individual, IndividualProfileUpdate},
    error::ApiError,
    services::uploads::{read_file_field, UploadKind},
    types::Role,
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct UpdateIndividualRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub occupation: Option<String>,
}

// ============ Handlers ============

/// GET /api/individual/profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Individual>, ApiError> {
    user.require(Role::Individual)?;

    let individual = state
        .db
        .individual_by_user(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Individual profile".to_string()))?;

    Ok(Json(individual))
}

/// PUT /api/individual/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateIndividualRequest>,
) -> Result<Json<Individual>, ApiError> {
    user.require(Role::Individual)?;

    // 이름은 비울 수 없음
    for (field, value) in [("first_name", &req.first_name), ("last_name", &req.last_name)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ApiError::ValidationError(format!("{} cannot be empty", field)));
        }
    }

    let update = IndividualProfileUpdate {
        first_name: req.first_name.map(|n| n.trim().to_string()),
        last_name: req.last_name.map(|n| n.trim().to_string()),
        phone: req.phone,
        location: req.location,
        occupation: req.occupation,
    };

    let individual = state
        .db
        .update_individual_profile(user.id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Individual profile".to_string()))?;

    Ok(Json(individual))
}

/// POST /api/individual/profile/photo (multipart `file`)
pub async fn upload_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<Individual>, ApiError> {
    user.require(Role::Individual)?;

    let mut url = None;
    while let Some(field) = multipart.next_field().await? {
        if matches!(field.name(), Some("file") | Some("photo")) {
            let file = read_file_field(field, state.uploads.max_bytes()).await?;
            url = Some(state.uploads.save(UploadKind::ProfilePhoto, &file).await?);
            break;
        }
    }
    let url = url.ok_or_else(|| ApiError::ValidationError("file field is required".to_string()))?;

    let individual = state
        .db
        .set_individual_photo(user.id, &url)
        .await?
        .ok_or_else(|| ApiError::NotFound("Individual profile".to_string()))?;

    Ok(Json(individual))
}
