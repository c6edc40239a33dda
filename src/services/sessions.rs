//! Password Hashing and Session Tokens
//!
//! # Interview Q&A
//!
//! Q: 세션 토큰을 DB에 그대로 저장하지 않는 이유는?
//! A: DB가 유출돼도 쿠키를 재구성할 수 없게 하기 위해
//!
//!    ```text
//!    쿠키:  fv_session = hex(32 random bytes)
//!    DB:    sessions.token_hash = hex(SHA3-256(token))
//!    ```
//!
//! Q: bcrypt는 왜 spawn_blocking에서 실행하는가?
//! A: cost 12 해싱은 수백 ms 걸리는 CPU 작업
//!    - async 워커 스레드를 막으면 다른 요청까지 지연됨
//!
//! Q: 없는 이메일로 로그인하면?
//! A: 더미 해시로 한 번 검증한 뒤 실패 처리
//!    - 응답 시간으로 가입 여부를 알 수 없게 함

use anyhow::{Context, Result};
use rand::RngCore;
use sha3::{Digest, Sha3_256};
use tokio::sync::OnceCell;

/// 세션 쿠키 이름
pub const SESSION_COOKIE: &str = "fv_session";

/// 최소 비밀번호 길이
pub const MIN_PASSWORD_LEN: usize = 8;

/// 새 세션 토큰 (64자 hex)
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 토큰의 저장용 digest
pub fn digest(token: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// bcrypt 해시 (blocking 풀에서 실행)
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .context("password hashing task failed")?
        .context("bcrypt hash failed")
}

/// bcrypt 검증
///
/// 해시 형식이 깨져 있으면 false
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("password verification task failed")?;

    Ok(verified.unwrap_or(false))
}

static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// 존재하지 않는 계정용 bcrypt 해시 (프로세스당 한 번 생성)
pub async fn dummy_hash() -> Result<&'static str> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| hash_password(generate_token()))
        .await?;
    Ok(hash.as_str())
}

/// 실제 계정과 같은 비용으로 검증하고 항상 false
pub async fn verify_unknown_account(password: String) -> Result<bool> {
    let hash = dummy_hash().await?.to_string();
    verify_password(password, hash).await?;
    Ok(false)
}
