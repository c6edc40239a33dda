//! Users, sessions and profile queries

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::{
    Company, CompanyProfileUpdate, Database, Individual, IndividualProfileUpdate, NewCompany,
    NewIndividual, SessionUser, User, UserSummary,
};

const COMPANY_COLUMNS: &str = r#"
    id, user_id, name, sector, logo_url, phone, location,
    employee_count, description, created_at, updated_at
"#;

const INDIVIDUAL_COLUMNS: &str = r#"
    id, user_id, first_name, last_name, phone, location,
    occupation, profile_picture_url, created_at, updated_at
"#;

impl Database {
    // ============ Users ============

    /// 이메일로 사용자 조회 (소문자 비교)
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// 회사 계정 + 프로필 생성 (단일 트랜잭션)
    ///
    /// 이메일 중복 시 unique 위반 → ApiError::Conflict
    pub async fn register_company(
        &self,
        email: &str,
        password_hash: &str,
        profile: &NewCompany,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let (user_id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'company') RETURNING id",
        )
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO companies (user_id, name, sector, phone, location, employee_count, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user_id)
        .bind(&profile.name)
        .bind(&profile.sector)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(profile.employee_count)
        .bind(&profile.description)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user_id)
    }

    /// 개인 계정 + 프로필 생성 (단일 트랜잭션)
    pub async fn register_individual(
        &self,
        email: &str,
        password_hash: &str,
        profile: &NewIndividual,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let (user_id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'individual') RETURNING id",
        )
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO individuals (user_id, first_name, last_name, phone, location, occupation)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(&profile.occupation)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user_id)
    }

    /// 관리자 계정이 하나도 없으면 생성
    ///
    /// 반환값: 새로 생성했으면 Some(user_id)
    pub async fn ensure_admin(&self, email: &str, password_hash: &str) -> Result<Option<i64>> {
        let (admins,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(&self.pool)
                .await?;
        if admins > 0 {
            return Ok(None);
        }

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'admin') RETURNING id",
        )
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(id))
    }

    /// 사용자 요약 정보 (메시지 상대 표시용)
    pub async fn user_summaries(&self, ids: &[i64]) -> Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT
                u.id,
                u.email,
                u.role,
                COALESCE(c.name, i.first_name || ' ' || i.last_name) AS display_name,
                COALESCE(c.logo_url, i.profile_picture_url) AS avatar_url
            FROM users u
            LEFT JOIN companies c ON c.user_id = u.id
            LEFT JOIN individuals i ON i.user_id = u.id
            WHERE u.id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// 사용자 존재 여부
    pub async fn user_exists(&self, user_id: i64) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // ============ Sessions ============

    /// 세션 저장 (토큰 원문이 아닌 digest만 저장)
    pub async fn create_session(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 유효한 세션의 사용자 조회 (만료된 세션은 없는 것으로 취급)
    pub async fn find_session_user(&self, token_hash: &str) -> Result<Option<SessionUser>> {
        let user = sqlx::query_as::<_, SessionUser>(
            r#"
            SELECT u.id, u.email, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// 만료 세션 정리
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ============ Companies ============

    pub async fn company_by_user(&self, user_id: i64) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn company_by_id(&self, id: i64) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    /// 회사 프로필 부분 수정
    pub async fn update_company_profile(
        &self,
        user_id: i64,
        update: &CompanyProfileUpdate,
    ) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                sector = COALESCE($3, sector),
                phone = COALESCE($4, phone),
                location = COALESCE($5, location),
                employee_count = COALESCE($6, employee_count),
                description = COALESCE($7, description),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.sector)
        .bind(&update.phone)
        .bind(&update.location)
        .bind(update.employee_count)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn set_company_logo(&self, user_id: i64, logo_url: &str) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies SET logo_url = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(logo_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    // ============ Individuals ============

    pub async fn individual_by_user(&self, user_id: i64) -> Result<Option<Individual>> {
        let individual = sqlx::query_as::<_, Individual>(&format!(
            "SELECT {INDIVIDUAL_COLUMNS} FROM individuals WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(individual)
    }

    /// 개인 프로필 부분 수정
    pub async fn update_individual_profile(
        &self,
        user_id: i64,
        update: &IndividualProfileUpdate,
    ) -> Result<Option<Individual>> {
        let individual = sqlx::query_as::<_, Individual>(&format!(
            r#"
            UPDATE individuals SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                location = COALESCE($5, location),
                occupation = COALESCE($6, occupation),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {INDIVIDUAL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(&update.location)
        .bind(&update.occupation)
        .fetch_optional(&self.pool)
        .await?;

        Ok(individual)
    }

    pub async fn set_individual_photo(
        &self,
        user_id: i64,
        photo_url: &str,
    ) -> Result<Option<Individual>> {
        let individual = sqlx::query_as::<_, Individual>(&format!(
            r#"
            UPDATE individuals SET profile_picture_url = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {INDIVIDUAL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(photo_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(individual)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::error::ApiError;

    fn company(name: &str) -> NewCompany {
        NewCompany {
            name: name.to_string(),
            sector: None,
            phone: None,
            location: None,
            employee_count: Some(12),
            description: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_email_is_conflict(pool: Pool<Postgres>) -> anyhow::Result<()> {
        let db = Database::from_pool(pool);
        db.register_company("geral@verde.ao", "$2b$12$unused", &company("Verde")).await?;

        // 대소문자만 다른 이메일도 같은 계정
        let again = db
            .register_company("Geral@Verde.ao ", "$2b$12$unused", &company("Outra"))
            .await;
        assert!(matches!(again.map_err(ApiError::from), Err(ApiError::Conflict(_))));

        let individual = NewIndividual {
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            phone: None,
            location: None,
            occupation: None,
        };
        let again = db
            .register_individual("geral@verde.ao", "$2b$12$unused", &individual)
            .await;
        assert!(matches!(again.map_err(ApiError::from), Err(ApiError::Conflict(_))));

        // 실패한 가입은 프로필을 남기지 않음
        assert_eq!(db.list_companies().await?.len(), 1);

        Ok(())
    }
}
