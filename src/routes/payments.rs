//! Payment Proof Endpoints
//!
//! Companies and individuals upload proof of a compensation payment; an admin
//! later approves it and allocates it to projects as investments.
//!
//! ```text
//! POST /api/payment-proofs (pending) ──▶ admin approve ──▶ investments
//!                                     └▶ admin reject
//! ```

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::{
    auth::CurrentUser,
    db::{Investment, PaymentProof},
    error::ApiError,
    services::uploads::{read_file_field, UploadKind, UploadedFile},
    types::{Kz, Owner, Role},
    AppState,
};

// ============ Handlers ============

/// POST /api/payment-proofs
///
/// multipart 필드: `file` (필수), `amount` (필수), `sdg_id` (선택)
pub async fn create_payment_proof(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<PaymentProof>, ApiError> {
    let owner = resolve_owner(&state, &user).await?;

    let mut file: Option<UploadedFile> = None;
    let mut amount_raw: Option<String> = None;
    let mut sdg_raw: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => file = Some(read_file_field(field, state.uploads.max_bytes()).await?),
            Some("amount") => amount_raw = Some(field.text().await?),
            Some("sdg_id") => sdg_raw = Some(field.text().await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::ValidationError("file field is required".to_string()))?;
    let amount = parse_amount(amount_raw.as_deref())?;
    let sdg_id = parse_sdg_id(sdg_raw.as_deref())?;

    if let Some(sdg_id) = sdg_id {
        if state.db.sdg_by_id(sdg_id).await?.is_none() {
            return Err(ApiError::ValidationError(format!("Unknown SDG id {}", sdg_id)));
        }
    }

    let file_url = state.uploads.save(UploadKind::PaymentProof, &file).await?;
    let proof = state
        .db
        .create_payment_proof(owner, amount, &file_url, sdg_id)
        .await?;
    tracing::info!(proof_id = proof.id, amount, "Payment proof submitted");

    Ok(Json(proof))
}

/// GET /api/payment-proofs
pub async fn list_own_proofs(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<PaymentProof>>, ApiError> {
    let owner = resolve_owner(&state, &user).await?;
    Ok(Json(state.db.proofs_for_owner(owner).await?))
}

/// GET /api/investments
pub async fn list_own_investments(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Investment>>, ApiError> {
    let owner = resolve_owner(&state, &user).await?;
    Ok(Json(state.db.investments_for_owner(owner).await?))
}

// ============ Helpers ============

/// 로그인 사용자 → 회사 / 개인 프로필 id
async fn resolve_owner(state: &AppState, user: &CurrentUser) -> Result<Owner, ApiError> {
    match user.role {
        Role::Company => state
            .db
            .company_by_user(user.id)
            .await?
            .map(|c| Owner::Company(c.id))
            .ok_or_else(|| ApiError::NotFound("Company profile".to_string())),
        Role::Individual => state
            .db
            .individual_by_user(user.id)
            .await?
            .map(|i| Owner::Individual(i.id))
            .ok_or_else(|| ApiError::NotFound("Individual profile".to_string())),
        Role::Admin => Err(ApiError::Forbidden(
            "Payment proofs belong to companies or individuals".to_string(),
        )),
    }
}

fn parse_amount(raw: Option<&str>) -> Result<f64, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::ValidationError("amount is required".to_string()))?;

    let amount = Kz::parse_lenient(raw).0;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::ValidationError("amount must be positive".to_string()));
    }
    Ok(amount)
}

fn parse_sdg_id(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::ValidationError(format!("Invalid sdg_id: {}", value))),
    }
}
