//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 사용자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Company,
    Individual,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Company => "company",
            Role::Individual => "individual",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "company" => Ok(Role::Company),
            "individual" => Ok(Role::Individual),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 결제 증빙 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProofStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofStatus::Pending => "pending",
            ProofStatus::Approved => "approved",
            ProofStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ProofStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProofStatus::Pending),
            "approved" => Ok(ProofStatus::Approved),
            "rejected" => Ok(ProofStatus::Rejected),
            other => Err(format!("Unknown payment proof status: {}", other)),
        }
    }
}

/// 결제 증빙 / 투자의 소유자 (회사 또는 개인, 둘 중 하나)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Company(i64),
    Individual(i64),
}

impl Owner {
    /// (company_id, individual_id) 컬럼 쌍으로 변환
    pub fn columns(&self) -> (Option<i64>, Option<i64>) {
        match *self {
            Owner::Company(id) => (Some(id), None),
            Owner::Individual(id) => (None, Some(id)),
        }
    }

    /// 컬럼 쌍에서 복원 (정확히 하나만 있어야 함)
    pub fn from_columns(company_id: Option<i64>, individual_id: Option<i64>) -> Option<Self> {
        match (company_id, individual_id) {
            (Some(id), None) => Some(Owner::Company(id)),
            (None, Some(id)) => Some(Owner::Individual(id)),
            _ => None,
        }
    }
}

/// 금액 타입 (Kz, 앙골라 콴자)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Kz(pub f64);

impl Kz {
    /// pt-AO 형식으로 변환
    ///
    /// `1234567.5` → `"1.234.567,50 Kz"`
    pub fn format(&self) -> String {
        let value = if self.0.is_finite() { self.0 } else { 0.0 };
        let cents = (value.abs() * 100.0).round() as u128;
        let whole = (cents / 100).to_string();
        let frac = cents % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
        format!("{}{},{:02} Kz", sign, grouped, frac)
    }

    /// 통화 형식 문자열을 관대하게 파싱
    ///
    /// 숫자가 아닌 문자는 제거. 마지막 `.` 뒤에 `,`가 있으면 pt-AO 형식
    /// (`.` 천 단위, `,` 소수점), 그렇지 않으면 `,`를 천 단위 구분자로 취급.
    /// 쉼표 없이 점이 하나이고 그 뒤가 정확히 3자리면 천 단위 (`"5.000"` = 5000).
    /// 숫자가 하나도 없으면 0.
    pub fn parse_lenient(raw: &str) -> Kz {
        let last_dot = raw.rfind('.');
        let dot_is_grouping = match (last_dot, raw.contains(',')) {
            (Some(dot), false) => {
                raw.matches('.').count() > 1
                    || raw[dot + 1..].chars().filter(|c| c.is_ascii_digit()).count() == 3
            }
            _ => false,
        };
        let last_comma = raw.rfind(',');
        let comma_is_decimal = match (last_dot, last_comma) {
            (Some(dot), Some(comma)) => comma > dot,
            // "1234,5" 처럼 쉼표 하나 뒤에 1~2자리면 소수점
            (None, Some(comma)) => {
                raw.matches(',').count() == 1
                    && raw[comma + 1..].chars().filter(|c| c.is_ascii_digit()).count() <= 2
            }
            _ => false,
        };

        let mut cleaned = String::with_capacity(raw.len());
        let mut seen_decimal = false;
        for ch in raw.chars() {
            match ch {
                '0'..='9' => cleaned.push(ch),
                '-' if cleaned.is_empty() => cleaned.push('-'),
                ',' if comma_is_decimal && !seen_decimal => {
                    cleaned.push('.');
                    seen_decimal = true;
                }
                '.' if !comma_is_decimal && !dot_is_grouping && !seen_decimal => {
                    cleaned.push('.');
                    seen_decimal = true;
                }
                _ => {}
            }
        }

        Kz(cleaned.parse::<f64>().unwrap_or(0.0))
    }
}

impl fmt::Display for Kz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// 이메일 형식 간단 검증
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
