//! Session Authentication
//!
//! # Interview Q&A
//!
//! Q: 인증 흐름은?
//! A: 쿠키 기반 서버 세션
//!
//!    ```text
//!    POST /api/login  → bcrypt 검증 → 토큰 생성 → sessions(token_hash) insert
//!                     → Set-Cookie: fv_session=<token>; HttpOnly; SameSite=Lax
//!    이후 요청         → 쿠키 토큰 digest → sessions JOIN users → CurrentUser
//!    POST /api/logout → 세션 삭제 + 쿠키 만료
//!    ```
//!
//! Q: 역할 검사는 어디서 하는가?
//! A: 핸들러 진입 시 `CurrentUser::require(Role::Admin)` 한 줄
//!    - 세션 없음 → 401, 역할 불일치 → 403

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tower_cookies::{
    cookie::{time, SameSite},
    Cookie, Cookies,
};

use crate::{
    error::ApiError,
    services::sessions::{self, SESSION_COOKIE},
    types::Role,
    AppState,
};

/// 로그인한 사용자
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// 역할 검사 (불일치 시 403)
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            tracing::warn!(user_id = self.id, required = %role, "Role check failed");
            Err(ApiError::Forbidden(format!("{} access required", role)))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| {
                tracing::error!("Cookie layer missing: {}", msg);
                ApiError::InternalError
            })?;

        let token = cookies
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let user = state
            .db
            .find_session_user(&sessions::digest(&token))
            .await?
            .ok_or_else(|| {
                tracing::warn!(path = %parts.uri.path(), "Unknown or expired session");
                ApiError::Unauthorized
            })?;

        let role = user.role.parse::<Role>().map_err(|e| {
            tracing::error!(user_id = user.id, "Stored role is invalid: {}", e);
            ApiError::InternalError
        })?;

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            role,
        })
    }
}

/// 새 세션 생성 후 쿠키 설정
pub async fn start_session(state: &AppState, cookies: &Cookies, user_id: i64) -> Result<(), ApiError> {
    let token = sessions::generate_token();
    let ttl = state.config.session_ttl;
    let expires_at = Utc::now()
        + chrono::Duration::from_std(ttl).map_err(|_| ApiError::InternalError)?;

    state
        .db
        .create_session(&sessions::digest(&token), user_id, expires_at)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production())
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build();
    cookies.add(cookie);

    Ok(())
}

/// 세션 삭제 + 쿠키 만료 (세션이 없어도 성공)
pub async fn end_session(state: &AppState, cookies: &Cookies) -> Result<(), ApiError> {
    if let Some(token) = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        state.db.delete_session(&sessions::digest(&token)).await?;
    }

    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok(())
}
