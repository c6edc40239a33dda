//! PostgreSQL access layer
//!
//! `Database`는 `PgPool` 하나를 감싸고, 쿼리는 도메인별 파일에 나뉘어 있음.
//!
//! # Interview Q&A
//!
//! Q: 회원가입이나 투자 생성처럼 여러 테이블을 건드리는 작업은?
//! A: 하나의 sqlx 트랜잭션 안에서 처리
//!    - 회원가입: users + companies/individuals 동시 insert
//!    - 투자: 결제 증빙 행을 `FOR UPDATE`로 잠근 뒤 잔액 검증 후 insert
//!    - 소유자(회사 XOR 개인)는 테이블 CHECK 제약으로도 강제
//!
//! Q: 프로젝트의 누적 투자액은 컬럼으로 두지 않는가?
//! A: 두지 않음, `SUM(investments.amount)`로 조회 시 계산
//!    - 투자 insert와 합계가 어긋날 여지가 없음
mod accounts;
mod catalog;
mod footprint;
mod messages;
mod models;
mod payments;
mod repository;

pub use models::*;
pub use repository::{MessageRepository, SdgInvestmentRepository};

#[cfg(test)]
pub use repository::mock;

use std::time::Duration;

use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// 데이터베이스 연결 및 쿼리 담당
///
/// 쿼리는 도메인별 하위 모듈(`accounts`, `catalog`, `payments`,
/// `footprint`, `messages`)의 `impl Database` 블록에 있음
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 즉시 연결 (기동 시 DB가 없으면 실패)
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = Self::pool_options().connect(database_url).await?;

        Ok(Self { pool })
    }

    /// 첫 쿼리 때 연결하는 풀 (`DB_STATUS=offline`, 통합 테스트)
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = Self::pool_options().connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// `#[sqlx::test]`이 만든 격리 DB 풀 사용
    #[cfg(test)]
    pub(crate) fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    // acquire 3초: 오프라인 DB에서 /health가 오래 매달리지 않도록
    fn pool_options() -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(3))
    }

    /// `migrations/` 적용 (스키마 + ODS 카탈로그 시드)
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// `/health`에서 사용하는 연결 확인
    pub async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
