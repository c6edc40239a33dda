//! Repository Pattern Implementation
//!
//! # Interview Q&A
//!
//! Q: 모든 쿼리를 trait로 추상화하지 않은 이유는?
//! A: CRUD 엔드포인트는 `Database`에 직접 쿼리가 더 명확
//!    - 단일 DB (PostgreSQL)만 사용
//!    - 집계 로직이 있는 서비스(ODS 목표 추적, 대화 그룹핑)만 trait 경유
//!    - 서비스 테스트는 Mock 구현으로 DB 없이 실행
//!
//!    ```rust,ignore
//!    // Route 레이어
//!    let conversations = load_conversations(state.db.as_ref(), user.id, view).await?;
//!
//!    // 테스트
//!    let conversations = load_conversations(&MockMessageRepository { .. }, 1, view).await?;
//!    ```

use anyhow::Result;
use async_trait::async_trait;

use super::{Database, Message, SdgTarget, SdgTotal, UserSummary};

/// 메시지 조회 인터페이스
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn messages_for_user(&self, user_id: i64) -> Result<Vec<Message>>;
    async fn user_summaries(&self, ids: &[i64]) -> Result<Vec<UserSummary>>;
}

/// ODS 투자 집계 인터페이스
#[async_trait]
pub trait SdgInvestmentRepository: Send + Sync {
    async fn sdg_totals(&self) -> Result<Vec<SdgTotal>>;
    async fn sdg_targets(&self) -> Result<Vec<SdgTarget>>;
}

#[async_trait]
impl MessageRepository for Database {
    async fn messages_for_user(&self, user_id: i64) -> Result<Vec<Message>> {
        Database::messages_for_user(self, user_id).await
    }

    async fn user_summaries(&self, ids: &[i64]) -> Result<Vec<UserSummary>> {
        Database::user_summaries(self, ids).await
    }
}

#[async_trait]
impl SdgInvestmentRepository for Database {
    async fn sdg_totals(&self) -> Result<Vec<SdgTotal>> {
        Database::sdg_totals(self).await
    }

    async fn sdg_targets(&self) -> Result<Vec<SdgTarget>> {
        Database::sdg_targets(self).await
    }
}
