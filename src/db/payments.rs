//! Payment proofs and investments

use anyhow::Result;

use super::{Database, Investment, PaymentProof, PaymentProofWithOwner};
use crate::error::ApiError;
use crate::types::{Owner, ProofStatus};

const PROOF_COLUMNS: &str = r#"
    id, company_id, individual_id, amount, file_url, status, sdg_id, created_at, updated_at
"#;

const PROOF_WITH_OWNER_SELECT: &str = r#"
    SELECT
        pp.id,
        pp.company_id,
        pp.individual_id,
        COALESCE(c.name, ind.first_name || ' ' || ind.last_name) AS owner_name,
        pp.amount,
        pp.file_url,
        pp.status,
        pp.sdg_id,
        pp.created_at
    FROM payment_proofs pp
    LEFT JOIN companies c ON c.id = pp.company_id
    LEFT JOIN individuals ind ON ind.id = pp.individual_id
"#;

impl Database {
    // ============ Payment Proofs ============

    /// 결제 증빙 등록 (항상 pending 상태로 시작)
    pub async fn create_payment_proof(
        &self,
        owner: Owner,
        amount: f64,
        file_url: &str,
        sdg_id: Option<i64>,
    ) -> Result<PaymentProof> {
        let (company_id, individual_id) = owner.columns();

        let proof = sqlx::query_as::<_, PaymentProof>(&format!(
            r#"
            INSERT INTO payment_proofs (company_id, individual_id, amount, file_url, sdg_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROOF_COLUMNS}
            "#
        ))
        .bind(company_id)
        .bind(individual_id)
        .bind(amount)
        .bind(file_url)
        .bind(sdg_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(proof)
    }

    /// 소유자의 결제 증빙 목록 (최신순)
    pub async fn proofs_for_owner(&self, owner: Owner) -> Result<Vec<PaymentProof>> {
        let (company_id, individual_id) = owner.columns();

        let proofs = sqlx::query_as::<_, PaymentProof>(&format!(
            r#"
            SELECT {PROOF_COLUMNS} FROM payment_proofs
            WHERE company_id IS NOT DISTINCT FROM $1
              AND individual_id IS NOT DISTINCT FROM $2
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(company_id)
        .bind(individual_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(proofs)
    }

    /// 관리자용 전체 목록 (상태 필터 옵션)
    pub async fn list_payment_proofs(
        &self,
        status: Option<ProofStatus>,
    ) -> Result<Vec<PaymentProofWithOwner>> {
        let proofs = sqlx::query_as::<_, PaymentProofWithOwner>(&format!(
            r#"
            {PROOF_WITH_OWNER_SELECT}
            WHERE ($1::TEXT IS NULL OR pp.status = $1)
            ORDER BY pp.created_at DESC, pp.id DESC
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(proofs)
    }

    /// ODS 배정 대기 큐: 승인됐지만 ODS가 없는 결제 증빙
    pub async fn proofs_without_sdg(&self) -> Result<Vec<PaymentProofWithOwner>> {
        let proofs = sqlx::query_as::<_, PaymentProofWithOwner>(&format!(
            r#"
            {PROOF_WITH_OWNER_SELECT}
            WHERE pp.status = 'approved' AND pp.sdg_id IS NULL
            ORDER BY pp.created_at ASC, pp.id ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(proofs)
    }

    /// 승인 / 거절
    ///
    /// 이미 투자에 사용된 증빙은 승인 상태에서 벗어날 수 없음.
    /// `create_investment`와 같은 증빙 row 잠금을 먼저 잡으므로 둘은 직렬화됨
    pub async fn set_proof_status(&self, id: i64, status: ProofStatus) -> Result<PaymentProof> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM payment_proofs WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(ApiError::NotFound("Payment proof".to_string()).into());
        }

        let (invested,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM investments WHERE payment_proof_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if invested > 0 && status != ProofStatus::Approved {
            return Err(ApiError::InvalidState(format!(
                "payment proof {} already funds {} investment(s)",
                id, invested
            ))
            .into());
        }

        let proof = sqlx::query_as::<_, PaymentProof>(&format!(
            r#"
            UPDATE payment_proofs SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROOF_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(proof)
    }

    /// ODS 배정 (동시 배정은 last-write-wins)
    pub async fn assign_proof_sdg(&self, id: i64, sdg_id: i64) -> Result<Option<PaymentProof>> {
        let proof = sqlx::query_as::<_, PaymentProof>(&format!(
            r#"
            UPDATE payment_proofs SET sdg_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROOF_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(sdg_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(proof)
    }

    // ============ Investments ============

    /// 승인된 결제 증빙을 프로젝트에 배분
    ///
    /// # Rules
    ///
    /// - 증빙은 approved 상태여야 함
    /// - 배분 합계는 증빙 금액을 넘을 수 없음 (`amount`가 없으면 잔액 전부)
    /// - 투자 소유자는 증빙 소유자를 그대로 따름
    /// - 증빙에 ODS가 없으면 프로젝트의 ODS로 채움
    /// - 증빙에 ODS가 있으면 프로젝트의 ODS와 같아야 함
    ///
    /// 증빙 row를 `FOR UPDATE`로 잠가 동시 배분 시 초과 배분을 막음
    pub async fn create_investment(
        &self,
        payment_proof_id: i64,
        project_id: i64,
        amount: Option<f64>,
    ) -> Result<Investment> {
        let mut tx = self.pool.begin().await?;

        let proof = sqlx::query_as::<_, PaymentProof>(&format!(
            "SELECT {PROOF_COLUMNS} FROM payment_proofs WHERE id = $1 FOR UPDATE"
        ))
        .bind(payment_proof_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment proof".to_string()))?;

        if proof.status != ProofStatus::Approved.as_str() {
            return Err(ApiError::InvalidState(format!(
                "payment proof {} is {}, not approved",
                proof.id, proof.status
            ))
            .into());
        }

        let owner = Owner::from_columns(proof.company_id, proof.individual_id)
            .ok_or(ApiError::InternalError)?;

        let project_sdg: Option<(i64,)> =
            sqlx::query_as("SELECT sdg_id FROM projects WHERE id = $1")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (project_sdg_id,) =
            project_sdg.ok_or_else(|| ApiError::NotFound("Project".to_string()))?;

        if let Some(tagged) = proof.sdg_id.filter(|&sdg| sdg != project_sdg_id) {
            return Err(ApiError::InvalidState(format!(
                "payment proof {} is tagged with SDG id {} but project {} belongs to SDG id {}",
                proof.id, tagged, project_id, project_sdg_id
            ))
            .into());
        }

        let (allocated,): (f64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)::DOUBLE PRECISION
            FROM investments WHERE payment_proof_id = $1
            "#,
        )
        .bind(proof.id)
        .fetch_one(&mut *tx)
        .await?;

        let remaining = proof.amount - allocated;
        let amount = amount.unwrap_or(remaining);
        if !(amount > 0.0) {
            return Err(ApiError::InvalidState(format!(
                "payment proof {} has no remaining balance",
                proof.id
            ))
            .into());
        }
        if amount > remaining + f64::EPSILON {
            return Err(ApiError::InvalidState(format!(
                "amount {} exceeds remaining balance {}",
                amount, remaining
            ))
            .into());
        }

        let (company_id, individual_id) = owner.columns();
        let investment = sqlx::query_as::<_, Investment>(
            r#"
            INSERT INTO investments (company_id, individual_id, project_id, payment_proof_id, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_id, individual_id, project_id, payment_proof_id, amount, created_at
            "#,
        )
        .bind(company_id)
        .bind(individual_id)
        .bind(project_id)
        .bind(proof.id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        if proof.sdg_id.is_none() {
            sqlx::query("UPDATE payment_proofs SET sdg_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(proof.id)
                .bind(project_sdg_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(investment)
    }

    /// 소유자의 투자 목록 (최신순)
    pub async fn investments_for_owner(&self, owner: Owner) -> Result<Vec<Investment>> {
        let (company_id, individual_id) = owner.columns();

        let investments = sqlx::query_as::<_, Investment>(
            r#"
            SELECT id, company_id, individual_id, project_id, payment_proof_id, amount, created_at
            FROM investments
            WHERE company_id IS NOT DISTINCT FROM $1
              AND individual_id IS NOT DISTINCT FROM $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(company_id)
        .bind(individual_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(investments)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::db::NewCompany;

    async fn company_owner(db: &Database, email: &str) -> anyhow::Result<Owner> {
        let profile = NewCompany {
            name: "Empresa Verde".to_string(),
            sector: None,
            phone: None,
            location: None,
            employee_count: None,
            description: None,
        };
        let user_id = db.register_company(email, "$2b$12$unused", &profile).await?;
        let company = db
            .company_by_user(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("company profile missing"))?;
        Ok(Owner::Company(company.id))
    }

    /// (project id, sdg id) of the first seeded project for an SDG number
    async fn seeded_project(db: &Database, sdg_number: i16) -> anyhow::Result<(i64, i64)> {
        let row = sqlx::query_as(
            r#"
            SELECT p.id, p.sdg_id FROM projects p
            JOIN sdgs s ON s.id = p.sdg_id
            WHERE s.number = $1
            ORDER BY p.id LIMIT 1
            "#,
        )
        .bind(sdg_number)
        .fetch_one(&db.pool)
        .await?;
        Ok(row)
    }

    fn is_invalid_state(result: Result<impl std::fmt::Debug>) -> bool {
        matches!(result.map_err(ApiError::from), Err(ApiError::InvalidState(_)))
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_investment_requires_approved_proof(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Database::from_pool(pool);
        let owner = company_owner(&db, "geral@verde.ao").await?;
        let (project_id, _) = seeded_project(&db, 6).await?;
        let proof = db.create_payment_proof(owner, 50_000.0, "/uploads/payment-proofs/a.pdf", None).await?;

        assert!(is_invalid_state(db.create_investment(proof.id, project_id, None).await));

        db.set_proof_status(proof.id, ProofStatus::Rejected).await?;
        assert!(is_invalid_state(db.create_investment(proof.id, project_id, None).await));

        db.set_proof_status(proof.id, ProofStatus::Approved).await?;
        let investment = db.create_investment(proof.id, project_id, None).await?;
        assert_eq!(investment.amount, 50_000.0);
        assert_eq!(investment.company_id, owner.columns().0);

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_allocations_never_exceed_proof_amount(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Database::from_pool(pool);
        let owner = company_owner(&db, "financas@verde.ao").await?;
        let (project_id, _) = seeded_project(&db, 7).await?;
        let proof = db.create_payment_proof(owner, 1_000.0, "/uploads/payment-proofs/b.png", None).await?;
        db.set_proof_status(proof.id, ProofStatus::Approved).await?;

        db.create_investment(proof.id, project_id, Some(600.0)).await?;
        assert!(is_invalid_state(db.create_investment(proof.id, project_id, Some(500.0)).await));

        // 금액 생략 = 남은 잔액 전부
        let rest = db.create_investment(proof.id, project_id, None).await?;
        assert_eq!(rest.amount, 400.0);
        assert!(is_invalid_state(db.create_investment(proof.id, project_id, None).await));

        let (allocated,): (f64,) = sqlx::query_as(
            "SELECT SUM(amount)::DOUBLE PRECISION FROM investments WHERE payment_proof_id = $1",
        )
        .bind(proof.id)
        .fetch_one(&db.pool)
        .await?;
        assert_eq!(allocated, 1_000.0);

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_invested_proof_stays_approved(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Database::from_pool(pool);
        let owner = company_owner(&db, "admin@verde.ao").await?;
        let (project_id, _) = seeded_project(&db, 13).await?;
        let proof = db.create_payment_proof(owner, 2_000.0, "/uploads/payment-proofs/c.pdf", None).await?;
        db.set_proof_status(proof.id, ProofStatus::Approved).await?;
        db.create_investment(proof.id, project_id, Some(1_000.0)).await?;

        assert!(is_invalid_state(db.set_proof_status(proof.id, ProofStatus::Rejected).await));
        assert!(is_invalid_state(db.set_proof_status(proof.id, ProofStatus::Pending).await));
        let still = db.set_proof_status(proof.id, ProofStatus::Approved).await?;
        assert_eq!(still.status, "approved");

        let missing = db.set_proof_status(proof.id + 1_000, ProofStatus::Approved).await;
        assert!(matches!(missing.map_err(ApiError::from), Err(ApiError::NotFound(_))));

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_review_and_allocation_are_serialised(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Arc::new(Database::from_pool(pool));
        let owner = company_owner(&db, "corrida@verde.ao").await?;
        let (project_id, _) = seeded_project(&db, 14).await?;

        for i in 0..10 {
            let proof_id = db
                .create_payment_proof(owner, 100.0, &format!("/uploads/payment-proofs/{}.pdf", i), None)
                .await?
                .id;
            db.set_proof_status(proof_id, ProofStatus::Approved).await?;

            let (reviewer, allocator) = (db.clone(), db.clone());
            let review = tokio::spawn(async move {
                reviewer.set_proof_status(proof_id, ProofStatus::Rejected).await
            });
            let allocate = tokio::spawn(async move {
                allocator.create_investment(proof_id, project_id, None).await
            });
            let (review, allocate) = (review.await?, allocate.await?);

            // 둘 중 정확히 하나만 성공
            assert_ne!(review.is_ok(), allocate.is_ok(), "proof {}", proof_id);

            let (status, invested): (String, i64) = sqlx::query_as(
                r#"
                SELECT pp.status, (SELECT COUNT(*) FROM investments i WHERE i.payment_proof_id = pp.id)
                FROM payment_proofs pp WHERE pp.id = $1
                "#,
            )
            .bind(proof_id)
            .fetch_one(&db.pool)
            .await?;
            assert!(
                invested == 0 || status == "approved",
                "proof {} is {} with {} investments",
                proof_id,
                status,
                invested
            );
        }

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_tagged_proof_must_match_project_sdg(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Database::from_pool(pool);
        let owner = company_owner(&db, "ods@verde.ao").await?;
        let (water_project, water_sdg) = seeded_project(&db, 6).await?;
        let (climate_project, climate_sdg) = seeded_project(&db, 13).await?;

        let tagged = db
            .create_payment_proof(owner, 300.0, "/uploads/payment-proofs/d.pdf", Some(water_sdg))
            .await?;
        db.set_proof_status(tagged.id, ProofStatus::Approved).await?;
        assert!(is_invalid_state(db.create_investment(tagged.id, climate_project, None).await));
        db.create_investment(tagged.id, water_project, None).await?;

        // ODS가 없는 증빙은 프로젝트의 ODS를 물려받음
        let untagged = db.create_payment_proof(owner, 300.0, "/uploads/payment-proofs/e.pdf", None).await?;
        db.set_proof_status(untagged.id, ProofStatus::Approved).await?;
        db.create_investment(untagged.id, climate_project, Some(100.0)).await?;
        let queue = db.proofs_without_sdg().await?;
        assert!(queue.iter().all(|p| p.id != untagged.id));
        let (sdg_id,): (Option<i64>,) =
            sqlx::query_as("SELECT sdg_id FROM payment_proofs WHERE id = $1")
                .bind(untagged.id)
                .fetch_one(&db.pool)
                .await?;
        assert_eq!(sdg_id, Some(climate_sdg));

        Ok(())
    }
}
