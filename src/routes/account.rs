//! Account Endpoints
//!
//! Registration, login/logout and the current-user lookup. Sessions live in
//! the `sessions` table; the browser only holds the random `fv_session` token.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    auth::{self, CurrentUser},
    db::{Company, Individual, NewCompany, NewIndividual},
    error::ApiError,
    services::sessions::{self, MIN_PASSWORD_LEN},
    types::{is_valid_email, Role},
    AppState,
};

// ============ Request/Response Types ============

/// 회원가입 요청
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// company | individual
    pub role: Role,

    // 회사 프로필
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub employee_count: Option<i32>,
    pub description: Option<String>,

    // 개인 프로필
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub occupation: Option<String>,

    // 공통
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// 로그인 요청
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 현재 사용자 + 프로필
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual: Option<Individual>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============ Handlers ============

/// POST /api/register
///
/// 계정 + 프로필 생성 후 바로 로그인 상태로 만듦
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::ValidationError("Invalid email address".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::ValidationError(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = sessions::hash_password(req.password.clone()).await?;

    let user_id = match req.role {
        Role::Company => {
            let name = required(req.company_name.as_deref(), "company_name")?;
            let profile = NewCompany {
                name,
                sector: req.sector.clone(),
                phone: req.phone.clone(),
                location: req.location.clone(),
                employee_count: req.employee_count,
                description: req.description.clone(),
            };
            state.db.register_company(&email, &password_hash, &profile).await
        }
        Role::Individual => {
            let profile = NewIndividual {
                first_name: required(req.first_name.as_deref(), "first_name")?,
                last_name: required(req.last_name.as_deref(), "last_name")?,
                phone: req.phone.clone(),
                location: req.location.clone(),
                occupation: req.occupation.clone(),
            };
            state.db.register_individual(&email, &password_hash, &profile).await
        }
        Role::Admin => {
            return Err(ApiError::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            ))
        }
    }
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict("Email already registered".to_string()),
        other => other,
    })?;

    auth::start_session(&state, &cookies, user_id).await?;
    tracing::info!(user_id, role = %req.role, "User registered");

    user_response(&state, user_id, email, req.role).await.map(Json)
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let Some(user) = state.db.find_user_by_email(&req.email).await? else {
        // 가입 여부가 응답 시간으로 드러나지 않도록 같은 비용의 검증을 수행
        sessions::verify_unknown_account(req.password).await?;
        tracing::warn!("Failed login attempt for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !sessions::verify_password(req.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = user.id, "Failed login attempt");
        return Err(ApiError::InvalidCredentials);
    }

    let role = user.role.parse::<Role>().map_err(|e| {
        tracing::error!(user_id = user.id, "Stored role is invalid: {}", e);
        ApiError::InternalError
    })?;

    auth::start_session(&state, &cookies, user.id).await?;
    tracing::info!(user_id = user.id, "User logged in");

    user_response(&state, user.id, user.email, role).await.map(Json)
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<LogoutResponse>, ApiError> {
    auth::end_session(&state, &cookies).await?;
    Ok(Json(LogoutResponse { success: true }))
}

/// GET /api/user
pub async fn current_user(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    user_response(&state, user.id, user.email, user.role).await.map(Json)
}

// ============ Helpers ============

async fn user_response(
    state: &AppState,
    id: i64,
    email: String,
    role: Role,
) -> Result<UserResponse, ApiError> {
    let (company, individual) = match role {
        Role::Company => (state.db.company_by_user(id).await?, None),
        Role::Individual => (None, state.db.individual_by_user(id).await?),
        Role::Admin => (None, None),
    };

    Ok(UserResponse {
        id,
        email,
        role,
        company,
        individual,
    })
}

fn required(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::ValidationError(format!("{} is required", field)))
}
