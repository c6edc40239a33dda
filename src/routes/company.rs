//! Company Endpoints
//!
//! Profile, logo upload and monthly consumption records. The server computes
//! emissions and compensation value; clients only send raw consumption.

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    db::{Company, CompanyProfileUpdate, ConsumptionRecord, NewConsumptionRecord},
    error::ApiError,
    services::footprint::{self, ConsumptionInput},
    services::uploads::{read_file_field, UploadKind},
    types::{Kz, Role},
    AppState,
};

// ============ Request/Response Types ============

/// 프로필 부분 수정 (없는 필드는 그대로)
#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub employee_count: Option<i32>,
    pub description: Option<String>,
}

/// 소비 기록 입력
#[derive(Debug, Deserialize)]
pub struct ConsumptionRequest {
    #[serde(flatten)]
    pub consumption: ConsumptionInput,
    /// 1~12, 없으면 연간 기록
    pub month: Option<i16>,
    pub year: Option<i32>,
    /// 표시용 기간 라벨 (없으면 "MM/YYYY" 또는 "YYYY")
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConsumptionSummary {
    pub total_emission_kg_co2: f64,
    pub total_compensation_kz: f64,
    pub total_compensation_formatted: String,
    pub records: Vec<ConsumptionRecord>,
}

// ============ Handlers ============

/// GET /api/company/profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Company>, ApiError> {
    let company = own_company(&state, &user).await?;
    Ok(Json(company))
}

/// PUT /api/company/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateCompanyRequest>,
) -> Result<Json<Company>, ApiError> {
    user.require(Role::Company)?;

    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::ValidationError("name cannot be empty".to_string()));
    }
    if req.employee_count.is_some_and(|n| n < 0) {
        return Err(ApiError::ValidationError(
            "employee_count cannot be negative".to_string(),
        ));
    }

    let update = CompanyProfileUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        sector: req.sector,
        phone: req.phone,
        location: req.location,
        employee_count: req.employee_count,
        description: req.description,
    };

    let company = state
        .db
        .update_company_profile(user.id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company profile".to_string()))?;

    Ok(Json(company))
}

/// POST /api/company/logo (multipart `file`)
pub async fn upload_logo(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<Company>, ApiError> {
    user.require(Role::Company)?;

    let mut url = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file = read_file_field(field, state.uploads.max_bytes()).await?;
            url = Some(state.uploads.save(UploadKind::Logo, &file).await?);
            break;
        }
    }
    let url = url.ok_or_else(|| ApiError::ValidationError("file field is required".to_string()))?;

    let company = state
        .db
        .set_company_logo(user.id, &url)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company profile".to_string()))?;

    Ok(Json(company))
}

/// GET /api/company/consumption
pub async fn list_consumption(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ConsumptionSummary>, ApiError> {
    let company = own_company(&state, &user).await?;
    let records = state.db.consumption_for_company(company.id).await?;

    let total_emission_kg_co2 = records.iter().map(|r| r.emission_kg_co2).sum::<f64>();
    let total_compensation_kz = records.iter().map(|r| r.compensation_value_kz).sum::<f64>();

    Ok(Json(ConsumptionSummary {
        total_emission_kg_co2,
        total_compensation_kz,
        total_compensation_formatted: Kz(total_compensation_kz).format(),
        records,
    }))
}

/// POST /api/company/consumption
pub async fn add_consumption(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ConsumptionRequest>,
) -> Result<Json<ConsumptionRecord>, ApiError> {
    let company = own_company(&state, &user).await?;

    let year = req.year.unwrap_or_else(|| chrono::Utc::now().year());
    let period = validate_period(req.month, year, req.period.as_deref())?;
    let result = footprint::calculate(&req.consumption, state.config.co2_price_kz_per_tonne)?;

    let record = NewConsumptionRecord {
        company_id: company.id,
        energy_kwh: req.consumption.energy_kwh,
        fuel_liters: req.consumption.fuel_liters,
        fuel_type: result.fuel_type.map(|f| f.as_str().to_string()),
        transport_km: req.consumption.transport_km,
        transport_type: result.transport_type.map(|t| t.as_str().to_string()),
        water_m3: req.consumption.water_m3,
        waste_kg: req.consumption.waste_kg,
        emission_kg_co2: result.emission_kg_co2,
        compensation_value_kz: result.compensation_value_kz,
        period,
        month: req.month,
        year,
    };

    let created = state.db.insert_consumption_record(&record).await?;
    tracing::info!(
        company_id = company.id,
        emission_kg_co2 = created.emission_kg_co2,
        "Consumption record added"
    );

    Ok(Json(created))
}

// ============ Helpers ============

async fn own_company(state: &AppState, user: &CurrentUser) -> Result<Company, ApiError> {
    user.require(Role::Company)?;
    state
        .db
        .company_by_user(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company profile".to_string()))
}

/// 월 / 연도 검증 후 기간 라벨 생성
fn validate_period(month: Option<i16>, year: i32, label: Option<&str>) -> Result<String, ApiError> {
    if !(2000..=2100).contains(&year) {
        return Err(ApiError::ValidationError(format!("Invalid year: {}", year)));
    }
    if let Some(month) = month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::ValidationError(format!("Invalid month: {}", month)));
        }
    }

    let label = label.map(str::trim).filter(|l| !l.is_empty());
    Ok(match (label, month) {
        (Some(label), _) => label.to_string(),
        (None, Some(month)) => format!("{:02}/{}", month, year),
        (None, None) => year.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_labels() {
        assert_eq!(validate_period(Some(3), 2024, None).unwrap(), "03/2024");
        assert_eq!(validate_period(None, 2024, None).unwrap(), "2024");
        assert_eq!(validate_period(Some(3), 2024, Some(" T1 ")).unwrap(), "T1");
    }

    #[test]
    fn test_period_rejects_out_of_range() {
        assert!(validate_period(Some(13), 2024, None).is_err());
        assert!(validate_period(Some(0), 2024, None).is_err());
        assert!(validate_period(None, 1999, None).is_err());
    }

    #[test]
    fn test_consumption_request_flattens_input() {
        let req: ConsumptionRequest = serde_json::from_str(
            r#"{"energy_kwh": 120.5, "fuel_liters": 10, "fuel_type": "diesel", "month": 5, "year": 2024}"#,
        )
        .unwrap();
        assert_eq!(req.consumption.energy_kwh, 120.5);
        assert_eq!(req.consumption.fuel_liters, 10.0);
        assert_eq!(req.consumption.water_m3, 0.0);
        assert_eq!(req.month, Some(5));
    }
}
