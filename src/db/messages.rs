//! Direct messages between users and the admin

use anyhow::Result;

use super::{Database, Message};

impl Database {
    /// 사용자가 보내거나 받은 메시지 전체
    pub async fn messages_for_user(&self, user_id: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, from_user_id, to_user_id, content, is_read, created_at
            FROM messages
            WHERE from_user_id = $1 OR to_user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn insert_message(
        &self,
        from_user_id: i64,
        to_user_id: i64,
        content: &str,
    ) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (from_user_id, to_user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, from_user_id, to_user_id, content, is_read, created_at
            "#,
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// 읽음 처리
    ///
    /// `from_user_id`가 None이면 수신한 모든 메시지를 읽음 처리
    pub async fn mark_messages_read(
        &self,
        reader_id: i64,
        from_user_id: Option<i64>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = TRUE
            WHERE to_user_id = $1
              AND is_read = FALSE
              AND ($2::BIGINT IS NULL OR from_user_id = $2)
            "#,
        )
        .bind(reader_id)
        .bind(from_user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
