//! Admin Endpoints
//!
//! Dashboard stats, company oversight, payment proof review, investment
//! allocation and SDG target management. Every handler requires `Role::Admin`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    db::{AdminStats, Company, CompanyFootprint, ConsumptionRecord, Investment, PaymentProof, PaymentProofWithOwner},
    error::ApiError,
    services::sdg_targets::{self, TargetBook, SDG_COUNT},
    services::InvestmentOverview,
    types::{Kz, ProofStatus, Role},
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct ProofQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProofStatusRequest {
    pub status: ProofStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignSdgRequest {
    pub sdg_id: i64,
}

/// 투자 배분 요청 (`amount`가 없으면 증빙 잔액 전부)
#[derive(Debug, Deserialize)]
pub struct CreateInvestmentRequest {
    pub payment_proof_id: i64,
    pub project_id: i64,
    pub amount: Option<AmountInput>,
}

/// 숫자 또는 통화 형식 문자열 (`"1.500.000,00 Kz"`)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn value(&self) -> f64 {
        match self {
            AmountInput::Number(n) => *n,
            AmountInput::Text(s) => Kz::parse_lenient(s).0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TargetEntry {
    pub sdg_number: i16,
    pub target_kz: AmountInput,
}

/// 목표 일괄 수정. `reset`이면 저장된 목표를 지운 뒤 적용
#[derive(Debug, Deserialize)]
pub struct UpdateTargetsRequest {
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Serialize)]
pub struct TargetView {
    pub sdg_number: i16,
    pub target_kz: f64,
    pub target_formatted: String,
    pub is_default: bool,
}

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub default_target: f64,
    pub targets: Vec<TargetView>,
}

#[derive(Debug, Serialize)]
pub struct CompanyDetailResponse {
    pub company: Company,
    pub footprint: Option<CompanyFootprint>,
    pub consumption: Vec<ConsumptionRecord>,
}

// ============ Dashboard ============

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<AdminStats>, ApiError> {
    user.require(Role::Admin)?;
    Ok(Json(state.db.admin_stats().await?))
}

/// GET /api/admin/companies
pub async fn list_companies(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Company>>, ApiError> {
    user.require(Role::Admin)?;
    Ok(Json(state.db.list_companies().await?))
}

/// GET /api/admin/companies/:id
pub async fn get_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CompanyDetailResponse>, ApiError> {
    user.require(Role::Admin)?;

    let company = state
        .db
        .company_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company {}", id)))?;
    let footprint = state.db.company_footprint(id).await?;
    let consumption = state.db.consumption_for_company(id).await?;

    Ok(Json(CompanyDetailResponse {
        company,
        footprint,
        consumption,
    }))
}

// ============ Payment Proofs ============

/// GET /api/admin/payment-proofs?status=
pub async fn list_payment_proofs(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ProofQuery>,
) -> Result<Json<Vec<PaymentProofWithOwner>>, ApiError> {
    user.require(Role::Admin)?;

    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<ProofStatus>().map_err(ApiError::ValidationError)?),
    };

    Ok(Json(state.db.list_payment_proofs(status).await?))
}

/// PUT /api/admin/payment-proofs/:id/status
pub async fn update_proof_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ProofStatusRequest>,
) -> Result<Json<PaymentProof>, ApiError> {
    user.require(Role::Admin)?;

    let proof = state.db.set_proof_status(id, req.status).await?;
    tracing::info!(proof_id = id, status = req.status.as_str(), "Payment proof reviewed");

    Ok(Json(proof))
}

/// GET /api/admin/payment-proofs/without-sdg
pub async fn proofs_without_sdg(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<PaymentProofWithOwner>>, ApiError> {
    user.require(Role::Admin)?;
    Ok(Json(state.db.proofs_without_sdg().await?))
}

/// PUT /api/admin/payment-proofs/:id/sdg
///
/// 동시 수정 시 마지막 쓰기가 반영됨
pub async fn assign_proof_sdg(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<AssignSdgRequest>,
) -> Result<Json<PaymentProof>, ApiError> {
    user.require(Role::Admin)?;

    if state.db.sdg_by_id(req.sdg_id).await?.is_none() {
        return Err(ApiError::ValidationError(format!("Unknown SDG id {}", req.sdg_id)));
    }

    let proof = state
        .db
        .assign_proof_sdg(id, req.sdg_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Payment proof {}", id)))?;
    tracing::info!(proof_id = id, sdg_id = req.sdg_id, "SDG assigned to payment proof");

    Ok(Json(proof))
}

// ============ Investments ============

/// POST /api/admin/investments
pub async fn create_investment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateInvestmentRequest>,
) -> Result<Json<Investment>, ApiError> {
    user.require(Role::Admin)?;

    let amount = req.amount.as_ref().map(AmountInput::value);
    if let Some(amount) = amount {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ApiError::ValidationError(
                "Investment amount must be positive".to_string(),
            ));
        }
    }

    let investment = state
        .db
        .create_investment(req.payment_proof_id, req.project_id, amount)
        .await?;
    tracing::info!(
        investment_id = investment.id,
        proof_id = req.payment_proof_id,
        project_id = req.project_id,
        amount = investment.amount,
        "Investment created"
    );

    Ok(Json(investment))
}

/// GET /api/admin/sdg-investments
pub async fn sdg_investments(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<InvestmentOverview>, ApiError> {
    user.require(Role::Admin)?;

    let overview =
        sdg_targets::load_overview(state.db.as_ref(), state.config.default_sdg_target_kz).await?;
    Ok(Json(overview))
}

// ============ SDG Targets ============

/// GET /api/admin/sdg-targets
pub async fn get_sdg_targets(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<TargetsResponse>, ApiError> {
    user.require(Role::Admin)?;
    targets_response(&state).await.map(Json)
}

/// PUT /api/admin/sdg-targets
///
/// 전체를 검증한 뒤 한 트랜잭션으로 저장 (하나라도 잘못되면 아무것도 안 바뀜)
pub async fn update_sdg_targets(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateTargetsRequest>,
) -> Result<Json<TargetsResponse>, ApiError> {
    user.require(Role::Admin)?;

    let mut entries = Vec::with_capacity(req.targets.len());
    for entry in &req.targets {
        let target = entry.target_kz.value();
        sdg_targets::validate_target(entry.sdg_number, target)?;
        entries.push((entry.sdg_number, target));
    }

    if req.reset || !entries.is_empty() {
        state.db.replace_sdg_targets(req.reset, &entries).await?;
    }
    tracing::info!(updated = entries.len(), reset = req.reset, "SDG targets updated");

    targets_response(&state).await.map(Json)
}

async fn targets_response(state: &AppState) -> Result<TargetsResponse, ApiError> {
    let stored = state.db.sdg_targets().await?;
    let default_target = state.config.default_sdg_target_kz;
    let book = TargetBook::with_targets(default_target, &stored);

    let targets = (1..=SDG_COUNT)
        .map(|number| {
            let target_kz = book.target(number);
            TargetView {
                sdg_number: number,
                target_kz,
                target_formatted: Kz(target_kz).format(),
                is_default: !stored.iter().any(|t| t.sdg_number == number),
            }
        })
        .collect();

    Ok(TargetsResponse {
        default_target,
        targets,
    })
}
