//! SDG Investment Target Tracking
//!
//! Per-SDG investment totals compared against admin-editable targets.
//!
//! # Percentage Rule
//!
//! ```text
//! percentage = min(100, amount / target(sdg) * 100)
//! amount == 0            → 0
//! unknown SDG number     → default target
//! ```
//!
//! Targets are persisted in `sdg_targets`; an SDG with no row uses the
//! configured default (`DEFAULT_SDG_TARGET_KZ`).

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

use crate::db::{SdgInvestmentRepository, SdgTarget, SdgTotal};
use crate::error::ApiError;
use crate::types::Kz;

/// ODS 개수 (1~17)
pub const SDG_COUNT: i16 = 17;

/// ODS 번호 → 목표 금액 매핑 (+ 기본값)
#[derive(Debug, Clone)]
pub struct TargetBook {
    default_target: f64,
    targets: HashMap<i16, f64>,
}

impl TargetBook {
    pub fn new(default_target: f64) -> Self {
        Self {
            default_target,
            targets: HashMap::new(),
        }
    }

    /// DB에 저장된 목표 값으로 채움
    pub fn with_targets(default_target: f64, rows: &[SdgTarget]) -> Self {
        let mut book = Self::new(default_target);
        for row in rows {
            if row.target_kz > 0.0 {
                book.targets.insert(row.sdg_number, row.target_kz);
            }
        }
        book
    }

    pub fn default_target(&self) -> f64 {
        self.default_target
    }

    /// ODS 목표 금액 (없으면 기본값)
    pub fn target(&self, sdg_number: i16) -> f64 {
        self.targets
            .get(&sdg_number)
            .copied()
            .unwrap_or(self.default_target)
    }

    /// 목표 금액 변경
    pub fn set(&mut self, sdg_number: i16, target: f64) -> Result<(), ApiError> {
        validate_target(sdg_number, target)?;
        self.targets.insert(sdg_number, target);
        Ok(())
    }

    /// 목표 대비 달성률 (0 ~ 100)
    pub fn calculate_percentage(&self, amount: f64, sdg_number: i16) -> f64 {
        if amount == 0.0 || !amount.is_finite() || amount < 0.0 {
            return 0.0;
        }
        let target = self.target(sdg_number);
        if !(target > 0.0) {
            return 0.0;
        }
        (amount / target * 100.0).min(100.0)
    }

    /// 통화 형식 문자열 금액의 달성률
    ///
    /// `"5.000.000,00 Kz"`, `"5,000,000"` 등을 정리한 뒤 계산
    pub fn calculate_percentage_str(&self, raw_amount: &str, sdg_number: i16) -> f64 {
        self.calculate_percentage(Kz::parse_lenient(raw_amount).0, sdg_number)
    }
}

/// 목표 값 검증: ODS 번호 1~17, 양수
pub fn validate_target(sdg_number: i16, target: f64) -> Result<(), ApiError> {
    if !(1..=SDG_COUNT).contains(&sdg_number) {
        return Err(ApiError::ValidationError(format!(
            "SDG number must be between 1 and {}, got {}",
            SDG_COUNT, sdg_number
        )));
    }
    if !target.is_finite() || target <= 0.0 {
        return Err(ApiError::ValidationError(format!(
            "Target for SDG {} must be a positive amount",
            sdg_number
        )));
    }
    Ok(())
}

// ============ Overview ============

/// ODS 하나의 진행 상황
#[derive(Debug, Clone, Serialize)]
pub struct SdgProgress {
    pub sdg_number: i16,
    pub name: Option<String>,
    pub color: Option<String>,
    pub total_amount: f64,
    pub total_formatted: String,
    pub target: f64,
    pub target_formatted: String,
    pub percentage: f64,
}

/// 관리자 "ods-investimentos" 화면 데이터
#[derive(Debug, Clone, Serialize)]
pub struct InvestmentOverview {
    pub sdgs: Vec<SdgProgress>,
    pub total_invested: f64,
    pub total_invested_formatted: String,
    pub default_target: f64,
}

/// 합계 + 목표 → 17개 ODS 전체 진행 상황
///
/// 합계에 없는 ODS는 0으로 채우고, 1~17 범위 밖 번호는 무시
pub fn build_overview(totals: &[SdgTotal], book: &TargetBook) -> InvestmentOverview {
    let by_number: HashMap<i16, &SdgTotal> = totals
        .iter()
        .filter(|t| (1..=SDG_COUNT).contains(&t.sdg_number))
        .map(|t| (t.sdg_number, t))
        .collect();

    let sdgs: Vec<SdgProgress> = (1..=SDG_COUNT)
        .map(|number| {
            let total = by_number.get(&number);
            let amount = total.map(|t| t.total_amount).unwrap_or(0.0);
            let target = book.target(number);
            SdgProgress {
                sdg_number: number,
                name: total.and_then(|t| t.name.clone()),
                color: total.and_then(|t| t.color.clone()),
                total_amount: amount,
                total_formatted: Kz(amount).format(),
                target,
                target_formatted: Kz(target).format(),
                percentage: book.calculate_percentage(amount, number),
            }
        })
        .collect();

    let total_invested = sdgs.iter().map(|s| s.total_amount).sum::<f64>();

    InvestmentOverview {
        sdgs,
        total_invested,
        total_invested_formatted: Kz(total_invested).format(),
        default_target: book.default_target(),
    }
}

/// 저장소에서 합계 / 목표를 읽어 overview 생성
pub async fn load_overview<R>(repo: &R, default_target: f64) -> Result<InvestmentOverview>
where
    R: SdgInvestmentRepository + ?Sized,
{
    let totals = repo.sdg_totals().await?;
    let targets = repo.sdg_targets().await?;
    let book = TargetBook::with_targets(default_target, &targets);

    Ok(build_overview(&totals, &book))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockSdgInvestmentRepository;
    use chrono::Utc;

    const DEFAULT: f64 = 10_000_000.0;

    fn total(number: i16, amount: f64) -> SdgTotal {
        SdgTotal {
            sdg_number: number,
            name: Some(format!("ODS {}", number)),
            color: None,
            total_amount: amount,
        }
    }

    #[test]
    fn test_half_of_target() {
        let book = TargetBook::new(DEFAULT);
        assert_eq!(book.calculate_percentage(5_000_000.0, 13), 50.0);
    }

    #[test]
    fn test_over_target_clamps_to_100() {
        let book = TargetBook::new(DEFAULT);
        assert_eq!(book.calculate_percentage(12_000_000.0, 13), 100.0);
    }

    #[test]
    fn test_zero_amount_is_zero() {
        let book = TargetBook::new(DEFAULT);
        for sdg in 1..=SDG_COUNT {
            assert_eq!(book.calculate_percentage(0.0, sdg), 0.0);
        }
    }

    #[test]
    fn test_percentage_bounded_for_all_sdgs() {
        let mut book = TargetBook::new(DEFAULT);
        book.set(7, 250_000.0).unwrap();
        let amounts = [0.0, 1.0, 999.99, 250_000.0, 5_000_000.0, 1e12, -10.0, f64::NAN];

        for sdg in 1..=SDG_COUNT {
            for amount in amounts {
                let pct = book.calculate_percentage(amount, sdg);
                assert!((0.0..=100.0).contains(&pct), "sdg {} amount {} → {}", sdg, amount, pct);
            }
        }
    }

    #[test]
    fn test_unknown_sdg_uses_default() {
        let book = TargetBook::new(DEFAULT);
        assert_eq!(book.target(42), DEFAULT);
        assert_eq!(book.calculate_percentage(2_500_000.0, 42), 25.0);
        assert_eq!(book.calculate_percentage(2_500_000.0, -1), 25.0);
    }

    #[test]
    fn test_custom_target_overrides_default() {
        let mut book = TargetBook::new(DEFAULT);
        book.set(6, 1_000_000.0).unwrap();
        assert_eq!(book.calculate_percentage(500_000.0, 6), 50.0);
        assert_eq!(book.calculate_percentage(500_000.0, 5), 5.0);
    }

    #[test]
    fn test_invalid_targets_rejected() {
        let mut book = TargetBook::new(DEFAULT);
        assert!(book.set(0, 100.0).is_err());
        assert!(book.set(18, 100.0).is_err());
        assert!(book.set(3, 0.0).is_err());
        assert!(book.set(3, -5.0).is_err());
        assert!(book.set(3, f64::INFINITY).is_err());
        assert_eq!(book.target(3), DEFAULT);
    }

    #[test]
    fn test_percentage_from_formatted_strings() {
        let book = TargetBook::new(DEFAULT);
        assert_eq!(book.calculate_percentage_str("5,000,000", 1), 50.0);
        assert_eq!(book.calculate_percentage_str("5.000.000,00 Kz", 1), 50.0);
        assert_eq!(book.calculate_percentage_str("Kz", 1), 0.0);
    }

    #[test]
    fn test_overview_zero_fills_all_sdgs() {
        let book = TargetBook::new(DEFAULT);
        let overview = build_overview(&[total(13, 5_000_000.0), total(99, 1.0)], &book);

        assert_eq!(overview.sdgs.len(), 17);
        assert_eq!(overview.sdgs[0].sdg_number, 1);
        assert_eq!(overview.sdgs[0].total_amount, 0.0);
        assert_eq!(overview.sdgs[0].percentage, 0.0);

        let climate = &overview.sdgs[12];
        assert_eq!(climate.sdg_number, 13);
        assert_eq!(climate.percentage, 50.0);
        assert_eq!(climate.total_formatted, "5.000.000,00 Kz");
        assert_eq!(overview.total_invested, 5_000_000.0);
    }

    #[test]
    fn test_load_overview_applies_stored_targets() {
        let repo = MockSdgInvestmentRepository {
            totals: vec![total(6, 750_000.0), total(7, 3_000_000.0)],
            targets: vec![SdgTarget {
                sdg_number: 6,
                target_kz: 1_500_000.0,
                updated_at: Utc::now(),
            }],
        };

        let overview = tokio_test::block_on(load_overview(&repo, DEFAULT)).unwrap();
        assert_eq!(overview.sdgs[5].target, 1_500_000.0);
        assert_eq!(overview.sdgs[5].percentage, 50.0);
        assert_eq!(overview.sdgs[6].target, DEFAULT);
        assert_eq!(overview.sdgs[6].percentage, 30.0);
        assert_eq!(overview.total_invested, 3_750_000.0);
    }
}
