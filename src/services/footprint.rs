//! Carbon Footprint Calculation
//!
//! Converts a company's monthly consumption into kg of CO2 and the Kz value
//! needed to compensate it, and ranks companies on the carbon leaderboard.
//!
//! # Emission Factors (kg CO2 per unit)
//!
//! | Source | Unit | Factor |
//! |---|---|---|
//! | Electricity | kWh | 0.30 |
//! | Diesel | L | 2.68 |
//! | Gasoline | L | 2.31 |
//! | LPG | L | 1.51 |
//! | Car | km | 0.171 |
//! | Motorcycle | km | 0.103 |
//! | Bus | km | 0.105 |
//! | Truck | km | 0.62 |
//! | Plane | km | 0.255 |
//! | Water | m³ | 0.344 |
//! | Waste | kg | 0.467 |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::CompanyFootprint;
use crate::error::ApiError;

const ELECTRICITY_KG_PER_KWH: f64 = 0.30;
const WATER_KG_PER_M3: f64 = 0.344;
const WASTE_KG_PER_KG: f64 = 0.467;

/// 연료 종류 (포르투갈어 / 영어 이름 모두 허용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Diesel,
    Gasoline,
    Lpg,
}

impl FuelType {
    pub fn kg_co2_per_liter(&self) -> f64 {
        match self {
            FuelType::Diesel => 2.68,
            FuelType::Gasoline => 2.31,
            FuelType::Lpg => 1.51,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Diesel => "diesel",
            FuelType::Gasoline => "gasoline",
            FuelType::Lpg => "lpg",
        }
    }
}

impl FromStr for FuelType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diesel" | "gasoleo" | "gasóleo" => Ok(FuelType::Diesel),
            "gasoline" | "petrol" | "gasolina" => Ok(FuelType::Gasoline),
            "lpg" | "gpl" | "gas" | "gás" => Ok(FuelType::Lpg),
            other => Err(ApiError::ValidationError(format!("Unknown fuel type: {}", other))),
        }
    }
}

/// 교통 수단
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Car,
    Motorcycle,
    Bus,
    Truck,
    Plane,
}

impl TransportType {
    pub fn kg_co2_per_km(&self) -> f64 {
        match self {
            TransportType::Car => 0.171,
            TransportType::Motorcycle => 0.103,
            TransportType::Bus => 0.105,
            TransportType::Truck => 0.62,
            TransportType::Plane => 0.255,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Car => "car",
            TransportType::Motorcycle => "motorcycle",
            TransportType::Bus => "bus",
            TransportType::Truck => "truck",
            TransportType::Plane => "plane",
        }
    }
}

impl FromStr for TransportType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "car" | "carro" | "viatura" => Ok(TransportType::Car),
            "motorcycle" | "mota" | "motorizada" => Ok(TransportType::Motorcycle),
            "bus" | "autocarro" => Ok(TransportType::Bus),
            "truck" | "camiao" | "camião" => Ok(TransportType::Truck),
            "plane" | "aviao" | "avião" => Ok(TransportType::Plane),
            other => Err(ApiError::ValidationError(format!(
                "Unknown transport type: {}",
                other
            ))),
        }
    }
}

/// 소비량 입력
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumptionInput {
    #[serde(default)]
    pub energy_kwh: f64,
    #[serde(default)]
    pub fuel_liters: f64,
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transport_km: f64,
    pub transport_type: Option<String>,
    #[serde(default)]
    pub water_m3: f64,
    #[serde(default)]
    pub waste_kg: f64,
}

/// 계산 결과
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FootprintResult {
    pub emission_kg_co2: f64,
    pub compensation_value_kz: f64,
    pub fuel_type: Option<FuelType>,
    pub transport_type: Option<TransportType>,
}

/// 배출량 / 보상 금액 계산
///
/// 수량은 0 이상의 유한한 값이어야 함. 연료/교통량이 있는데 종류가 없으면 에러.
pub fn calculate(input: &ConsumptionInput, co2_price_kz_per_tonne: f64) -> Result<FootprintResult, ApiError> {
    for (field, value) in [
        ("energy_kwh", input.energy_kwh),
        ("fuel_liters", input.fuel_liters),
        ("transport_km", input.transport_km),
        ("water_m3", input.water_m3),
        ("waste_kg", input.waste_kg),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "{} must be a non-negative number",
                field
            )));
        }
    }

    let fuel_type = parse_optional::<FuelType>(input.fuel_type.as_deref())?;
    let transport_type = parse_optional::<TransportType>(input.transport_type.as_deref())?;

    let fuel = match (fuel_type, input.fuel_liters) {
        (_, liters) if liters == 0.0 => 0.0,
        (Some(fuel), liters) => liters * fuel.kg_co2_per_liter(),
        (None, _) => {
            return Err(ApiError::ValidationError(
                "fuel_type is required when fuel_liters > 0".to_string(),
            ))
        }
    };

    let transport = match (transport_type, input.transport_km) {
        (_, km) if km == 0.0 => 0.0,
        (Some(mode), km) => km * mode.kg_co2_per_km(),
        (None, _) => {
            return Err(ApiError::ValidationError(
                "transport_type is required when transport_km > 0".to_string(),
            ))
        }
    };

    let emission_kg_co2 = input.energy_kwh * ELECTRICITY_KG_PER_KWH
        + fuel
        + transport
        + input.water_m3 * WATER_KG_PER_M3
        + input.waste_kg * WASTE_KG_PER_KG;

    let compensation_value_kz = emission_kg_co2 / 1000.0 * co2_price_kz_per_tonne;

    Ok(FootprintResult {
        emission_kg_co2: round2(emission_kg_co2),
        compensation_value_kz: round2(compensation_value_kz),
        fuel_type,
        transport_type,
    })
}

fn parse_optional<T: FromStr<Err = ApiError>>(raw: Option<&str>) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============ Leaderboard ============

/// 리더보드 항목
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub company_id: i64,
    pub company_name: String,
    pub sector: Option<String>,
    pub logo_url: Option<String>,
    pub total_emission_kg_co2: f64,
    pub total_compensation_due_kz: f64,
    pub total_compensated_kz: f64,
    /// 보상 비율 (0 ~ 100)
    pub compensation_rate: f64,
}

/// 배출 대비 보상 비율 (%)
///
/// 보상할 배출이 없으면: 납부액이 있으면 100, 없으면 0
pub fn compensation_rate(due_kz: f64, paid_kz: f64) -> f64 {
    if due_kz <= 0.0 {
        return if paid_kz > 0.0 { 100.0 } else { 0.0 };
    }
    (paid_kz / due_kz * 100.0).clamp(0.0, 100.0)
}

/// 보상 비율 → 납부액 → 회사명 순으로 정렬 후 순위 부여
pub fn rank_leaderboard(rows: Vec<CompanyFootprint>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = rows
        .into_iter()
        .map(|row| LeaderboardEntry {
            position: 0,
            compensation_rate: round2(compensation_rate(
                row.total_compensation_due_kz,
                row.total_compensated_kz,
            )),
            company_id: row.company_id,
            company_name: row.company_name,
            sector: row.sector,
            logo_url: row.logo_url,
            total_emission_kg_co2: row.total_emission_kg_co2,
            total_compensation_due_kz: row.total_compensation_due_kz,
            total_compensated_kz: row.total_compensated_kz,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.compensation_rate
            .total_cmp(&a.compensation_rate)
            .then(b.total_compensated_kz.total_cmp(&a.total_compensated_kz))
            .then_with(|| a.company_name.cmp(&b.company_name))
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.position = i + 1;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICE: f64 = 25_000.0;

    #[test]
    fn test_energy_only() {
        let input = ConsumptionInput {
            energy_kwh: 1000.0,
            ..Default::default()
        };
        let result = calculate(&input, PRICE).unwrap();
        assert_eq!(result.emission_kg_co2, 300.0);
        // 0.3 t × 25,000 Kz
        assert_eq!(result.compensation_value_kz, 7500.0);
    }

    #[test]
    fn test_mixed_sources() {
        let input = ConsumptionInput {
            energy_kwh: 100.0,
            fuel_liters: 10.0,
            fuel_type: Some("Gasóleo".into()),
            transport_km: 100.0,
            transport_type: Some("carro".into()),
            water_m3: 10.0,
            waste_kg: 10.0,
        };
        let result = calculate(&input, PRICE).unwrap();
        // 30 + 26.8 + 17.1 + 3.44 + 4.67
        assert_eq!(result.emission_kg_co2, 82.01);
        assert_eq!(result.fuel_type, Some(FuelType::Diesel));
        assert_eq!(result.transport_type, Some(TransportType::Car));
    }

    #[test]
    fn test_fuel_without_type_rejected() {
        let input = ConsumptionInput {
            fuel_liters: 5.0,
            ..Default::default()
        };
        assert!(calculate(&input, PRICE).is_err());
    }

    #[test]
    fn test_negative_and_unknown_rejected() {
        let negative = ConsumptionInput {
            water_m3: -1.0,
            ..Default::default()
        };
        assert!(calculate(&negative, PRICE).is_err());

        let unknown = ConsumptionInput {
            transport_km: 10.0,
            transport_type: Some("teleporte".into()),
            ..Default::default()
        };
        assert!(calculate(&unknown, PRICE).is_err());
    }

    #[test]
    fn test_compensation_rate_bounds() {
        assert_eq!(compensation_rate(0.0, 0.0), 0.0);
        assert_eq!(compensation_rate(0.0, 10.0), 100.0);
        assert_eq!(compensation_rate(1000.0, 250.0), 25.0);
        assert_eq!(compensation_rate(1000.0, 5000.0), 100.0);
    }

    fn footprint(id: i64, name: &str, due: f64, paid: f64) -> CompanyFootprint {
        CompanyFootprint {
            company_id: id,
            company_name: name.to_string(),
            sector: None,
            logo_url: None,
            total_emission_kg_co2: due / 25.0,
            total_compensation_due_kz: due,
            total_compensated_kz: paid,
        }
    }

    #[test]
    fn test_leaderboard_ranking() {
        let ranked = rank_leaderboard(vec![
            footprint(1, "Beta", 1000.0, 500.0),
            footprint(2, "Alfa", 1000.0, 1000.0),
            footprint(3, "Gama", 2000.0, 2000.0),
            footprint(4, "Delta", 0.0, 0.0),
        ]);

        let order: Vec<i64> = ranked.iter().map(|e| e.company_id).collect();
        // 100% 두 곳은 납부액 큰 순
        assert_eq!(order, vec![3, 2, 1, 4]);
        assert_eq!(ranked[0].position, 1);
        assert_eq!(ranked[3].position, 4);
        assert_eq!(ranked[2].compensation_rate, 50.0);
    }
}
