//! Consumption records, leaderboard source data and dashboard stats

use anyhow::Result;

use super::{AdminStats, CompanyFootprint, ConsumptionRecord, Database, NewConsumptionRecord};

const CONSUMPTION_COLUMNS: &str = r#"
    id, company_id, energy_kwh, fuel_liters, fuel_type, transport_km, transport_type,
    water_m3, waste_kg, emission_kg_co2, compensation_value_kz, period, month, year, created_at
"#;

const COMPANY_FOOTPRINT_SELECT: &str = r#"
    SELECT
        c.id AS company_id,
        c.name AS company_name,
        c.sector,
        c.logo_url,
        COALESCE(cr.total_emission, 0)::DOUBLE PRECISION AS total_emission_kg_co2,
        COALESCE(cr.total_due, 0)::DOUBLE PRECISION AS total_compensation_due_kz,
        COALESCE(pp.total_paid, 0)::DOUBLE PRECISION AS total_compensated_kz
    FROM companies c
    LEFT JOIN (
        SELECT company_id,
               SUM(emission_kg_co2) AS total_emission,
               SUM(compensation_value_kz) AS total_due
        FROM consumption_records
        GROUP BY company_id
    ) cr ON cr.company_id = c.id
    LEFT JOIN (
        SELECT company_id, SUM(amount) AS total_paid
        FROM payment_proofs
        WHERE status = 'approved' AND company_id IS NOT NULL
        GROUP BY company_id
    ) pp ON pp.company_id = c.id
"#;

impl Database {
    pub async fn insert_consumption_record(
        &self,
        record: &NewConsumptionRecord,
    ) -> Result<ConsumptionRecord> {
        let created = sqlx::query_as::<_, ConsumptionRecord>(&format!(
            r#"
            INSERT INTO consumption_records (
                company_id, energy_kwh, fuel_liters, fuel_type, transport_km, transport_type,
                water_m3, waste_kg, emission_kg_co2, compensation_value_kz, period, month, year
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {CONSUMPTION_COLUMNS}
            "#
        ))
        .bind(record.company_id)
        .bind(record.energy_kwh)
        .bind(record.fuel_liters)
        .bind(&record.fuel_type)
        .bind(record.transport_km)
        .bind(&record.transport_type)
        .bind(record.water_m3)
        .bind(record.waste_kg)
        .bind(record.emission_kg_co2)
        .bind(record.compensation_value_kz)
        .bind(&record.period)
        .bind(record.month)
        .bind(record.year)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// 회사 소비 기록 (최신 기간 먼저)
    pub async fn consumption_for_company(&self, company_id: i64) -> Result<Vec<ConsumptionRecord>> {
        let records = sqlx::query_as::<_, ConsumptionRecord>(&format!(
            r#"
            SELECT {CONSUMPTION_COLUMNS} FROM consumption_records
            WHERE company_id = $1
            ORDER BY year DESC, month DESC NULLS LAST, id DESC
            "#
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// 전체 회사의 배출 / 보상 합계
    pub async fn company_footprints(&self) -> Result<Vec<CompanyFootprint>> {
        let rows = sqlx::query_as::<_, CompanyFootprint>(COMPANY_FOOTPRINT_SELECT)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// 단일 회사의 배출 / 보상 합계
    pub async fn company_footprint(&self, company_id: i64) -> Result<Option<CompanyFootprint>> {
        let row = sqlx::query_as::<_, CompanyFootprint>(&format!(
            "{COMPANY_FOOTPRINT_SELECT} WHERE c.id = $1"
        ))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// 관리자 대시보드 통계
    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let stats = sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM companies) AS total_companies,
                (SELECT COUNT(*) FROM individuals) AS total_individuals,
                (SELECT COUNT(*) FROM payment_proofs WHERE status = 'pending') AS pending_proofs,
                (SELECT COUNT(*) FROM payment_proofs WHERE status = 'approved') AS approved_proofs,
                (SELECT COUNT(*) FROM payment_proofs WHERE status = 'rejected') AS rejected_proofs,
                (SELECT COUNT(*) FROM payment_proofs
                    WHERE status = 'approved' AND sdg_id IS NULL) AS proofs_without_sdg,
                (SELECT COALESCE(SUM(amount), 0)::DOUBLE PRECISION FROM investments) AS total_invested,
                (SELECT COALESCE(SUM(emission_kg_co2), 0)::DOUBLE PRECISION
                    FROM consumption_records) AS total_emission_kg_co2,
                (SELECT COUNT(*) FROM projects) AS total_projects
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
