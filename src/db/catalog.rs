//! SDG catalogue, projects and investment targets

use anyhow::Result;

use super::{Database, Project, Sdg, SdgTarget, SdgTotal};

const PROJECT_SELECT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.description,
        p.image_url,
        p.sdg_id,
        s.number AS sdg_number,
        COALESCE(SUM(i.amount), 0)::DOUBLE PRECISION AS total_invested,
        p.created_at
    FROM projects p
    JOIN sdgs s ON s.id = p.sdg_id
    LEFT JOIN investments i ON i.project_id = p.id
"#;

impl Database {
    pub async fn list_sdgs(&self) -> Result<Vec<Sdg>> {
        let sdgs = sqlx::query_as::<_, Sdg>(
            "SELECT id, number, name, description, color FROM sdgs ORDER BY number ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sdgs)
    }

    pub async fn sdg_by_id(&self, id: i64) -> Result<Option<Sdg>> {
        let sdg = sqlx::query_as::<_, Sdg>(
            "SELECT id, number, name, description, color FROM sdgs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sdg)
    }

    /// 프로젝트 목록 (total_invested는 SUM으로 계산)
    pub async fn list_projects(&self, sdg_id: Option<i64>) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            {PROJECT_SELECT}
            WHERE ($1::BIGINT IS NULL OR p.sdg_id = $1)
            GROUP BY p.id, s.number
            ORDER BY p.name ASC
            "#
        ))
        .bind(sdg_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// ODS별 투자 합계
    ///
    /// Investment → Project → SDG 조인. 투자가 없는 ODS도 0으로 포함
    pub async fn sdg_totals(&self) -> Result<Vec<SdgTotal>> {
        let totals = sqlx::query_as::<_, SdgTotal>(
            r#"
            SELECT
                s.number AS sdg_number,
                s.name,
                s.color,
                COALESCE(SUM(i.amount), 0)::DOUBLE PRECISION AS total_amount
            FROM sdgs s
            LEFT JOIN projects p ON p.sdg_id = s.id
            LEFT JOIN investments i ON i.project_id = p.id
            GROUP BY s.number, s.name, s.color
            ORDER BY s.number ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    pub async fn sdg_targets(&self) -> Result<Vec<SdgTarget>> {
        let targets = sqlx::query_as::<_, SdgTarget>(
            "SELECT sdg_number, target_kz, updated_at FROM sdg_targets ORDER BY sdg_number ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(targets)
    }

    /// ODS 목표 금액 저장 (단일 트랜잭션)
    ///
    /// `reset`이면 기존 목표를 모두 지운 뒤(기본값 복귀) `targets`를 upsert.
    /// 중간에 실패하면 아무것도 바뀌지 않음
    pub async fn replace_sdg_targets(&self, reset: bool, targets: &[(i16, f64)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if reset {
            sqlx::query("DELETE FROM sdg_targets")
                .execute(&mut *tx)
                .await?;
        }

        for &(sdg_number, target_kz) in targets {
            sqlx::query(
                r#"
                INSERT INTO sdg_targets (sdg_number, target_kz, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (sdg_number)
                DO UPDATE SET target_kz = EXCLUDED.target_kz, updated_at = NOW()
                "#,
            )
            .bind(sdg_number)
            .bind(target_kz)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Pool, Postgres};

    use super::*;

    fn stored(targets: &[SdgTarget]) -> Vec<(i16, f64)> {
        targets.iter().map(|t| (t.sdg_number, t.target_kz)).collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_replace_targets_upserts_and_resets(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Database::from_pool(pool);

        db.replace_sdg_targets(false, &[(6, 1_000_000.0), (13, 250_000.0)]).await?;
        db.replace_sdg_targets(false, &[(6, 2_000_000.0)]).await?;
        assert_eq!(stored(&db.sdg_targets().await?), vec![(6, 2_000_000.0), (13, 250_000.0)]);

        // reset: 목록에 없는 ODS는 기본값으로 돌아감
        db.replace_sdg_targets(true, &[(7, 500_000.0)]).await?;
        assert_eq!(stored(&db.sdg_targets().await?), vec![(7, 500_000.0)]);

        db.replace_sdg_targets(true, &[]).await?;
        assert!(db.sdg_targets().await?.is_empty());

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_replace_keeps_previous_targets(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Database::from_pool(pool);
        db.replace_sdg_targets(false, &[(6, 1_000_000.0), (14, 300_000.0)]).await?;

        // 두 번째 항목이 CHECK (target_kz > 0)에 걸림
        let failed = db.replace_sdg_targets(true, &[(7, 500_000.0), (13, -5.0)]).await;
        assert!(failed.is_err());

        assert_eq!(stored(&db.sdg_targets().await?), vec![(6, 1_000_000.0), (14, 300_000.0)]);

        Ok(())
    }
}
