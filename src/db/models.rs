//! Database Models
//!
//! Row types for users, profiles, the SDG catalogue, compensation payments
//! and footprint records. Amounts are stored in Kz as `DOUBLE PRECISION`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// 사용자 계정
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    /// admin | company | individual
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// 세션으로 조회한 사용자 (비밀번호 해시 제외)
#[derive(Debug, Clone, FromRow)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub role: String,
}

/// 대화 상대 표시용 요약 정보
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub role: String,
    /// 회사명 또는 "이름 성"
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// 회사 프로필
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Company {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub sector: Option<String>,
    pub logo_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub employee_count: Option<i32>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 개인 프로필
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Individual {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub occupation: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 지속가능발전목표 (ODS)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sdg {
    pub id: i64,
    /// 1~17
    pub number: i16,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// 프로젝트 + 파생 투자 합계
///
/// `total_invested`는 저장하지 않고 항상 investments에서 SUM으로 계산
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sdg_id: i64,
    pub sdg_number: i16,
    pub total_invested: f64,
    pub created_at: DateTime<Utc>,
}

/// 결제 증빙
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentProof {
    pub id: i64,
    pub company_id: Option<i64>,
    pub individual_id: Option<i64>,
    pub amount: f64,
    pub file_url: String,
    /// pending | approved | rejected
    pub status: String,
    pub sdg_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 관리자 목록용 결제 증빙 (소유자 이름 포함)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentProofWithOwner {
    pub id: i64,
    pub company_id: Option<i64>,
    pub individual_id: Option<i64>,
    pub owner_name: Option<String>,
    pub amount: f64,
    pub file_url: String,
    pub status: String,
    pub sdg_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 투자 (승인된 결제 증빙 → 프로젝트 배분)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Investment {
    pub id: i64,
    pub company_id: Option<i64>,
    pub individual_id: Option<i64>,
    pub project_id: i64,
    pub payment_proof_id: i64,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// 회사 소비 기록
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConsumptionRecord {
    pub id: i64,
    pub company_id: i64,
    pub energy_kwh: f64,
    pub fuel_liters: f64,
    pub fuel_type: Option<String>,
    pub transport_km: f64,
    pub transport_type: Option<String>,
    pub water_m3: f64,
    pub waste_kg: f64,
    pub emission_kg_co2: f64,
    pub compensation_value_kz: f64,
    pub period: String,
    pub month: Option<i16>,
    pub year: i32,
    pub created_at: DateTime<Utc>,
}

/// 새 소비 기록 (배출량은 서버에서 계산 후 채움)
#[derive(Debug, Clone)]
pub struct NewConsumptionRecord {
    pub company_id: i64,
    pub energy_kwh: f64,
    pub fuel_liters: f64,
    pub fuel_type: Option<String>,
    pub transport_km: f64,
    pub transport_type: Option<String>,
    pub water_m3: f64,
    pub waste_kg: f64,
    pub emission_kg_co2: f64,
    pub compensation_value_kz: f64,
    pub period: String,
    pub month: Option<i16>,
    pub year: i32,
}

/// 메시지
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// ODS별 투자 합계
#[derive(Debug, Clone, FromRow)]
pub struct SdgTotal {
    pub sdg_number: i16,
    pub name: Option<String>,
    pub color: Option<String>,
    pub total_amount: f64,
}

/// 관리자가 설정한 ODS 목표 금액
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SdgTarget {
    pub sdg_number: i16,
    pub target_kz: f64,
    pub updated_at: DateTime<Utc>,
}

/// 관리자 대시보드 통계
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminStats {
    pub total_companies: i64,
    pub total_individuals: i64,
    pub pending_proofs: i64,
    pub approved_proofs: i64,
    pub rejected_proofs: i64,
    pub proofs_without_sdg: i64,
    pub total_invested: f64,
    pub total_emission_kg_co2: f64,
    pub total_projects: i64,
}

/// 회사별 배출/보상 합계 (리더보드 원천 데이터)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CompanyFootprint {
    pub company_id: i64,
    pub company_name: String,
    pub sector: Option<String>,
    pub logo_url: Option<String>,
    pub total_emission_kg_co2: f64,
    pub total_compensation_due_kz: f64,
    pub total_compensated_kz: f64,
}

// ============ Write Inputs ============

/// 회원가입 시 회사 프로필
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub sector: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub employee_count: Option<i32>,
    pub description: Option<String>,
}

/// 회원가입 시 개인 프로필
#[derive(Debug, Clone)]
pub struct NewIndividual {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub occupation: Option<String>,
}

/// 회사 프로필 부분 수정 (None = 변경 없음)
#[derive(Debug, Clone, Default)]
pub struct CompanyProfileUpdate {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub employee_count: Option<i32>,
    pub description: Option<String>,
}

/// 개인 프로필 부분 수정 (None = 변경 없음)
#[derive(Debug, Clone, Default)]
pub struct IndividualProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub occupation: Option<String>,
}
