use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Standard-agnostic description of the risk being rated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub vehicle: Vehicle,
    pub driver: Driver,
    pub usage: Usage,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub model_year: i32,
    /// Cubic centimetres.
    pub engine_displacement: u32,
    pub fuel_type: FuelType,
    pub declared_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default)]
    pub security_features: Vec<SecurityFeature>,
    #[serde(default)]
    pub modifications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub date_of_birth: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licence_type: Option<LicenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<MaritalStatus>,
    pub no_claims_years: u32,
    /// Points declared on the licence itself; convictions are counted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_points: Option<u32>,
    #[serde(default)]
    pub convictions: Vec<Conviction>,
    #[serde(default)]
    pub claims_history: Vec<ClaimRecord>,
}

/// Conviction points stop counting after this many years.
pub const POINTS_LOOKBACK_YEARS: u32 = 3;

impl Driver {
    /// Completed years of age on `on`; `None` if `on` predates the birth date.
    pub fn age_on(&self, on: NaiveDate) -> Option<u32> {
        on.years_since(self.date_of_birth)
    }

    pub fn years_licensed_on(&self, on: NaiveDate) -> Option<u32> {
        self.license_issue_date
            .and_then(|issued| on.years_since(issued))
    }

    /// Penalty points still on the licence at `on`.
    pub fn outstanding_points(&self, on: NaiveDate) -> u32 {
        if let Some(points) = self.penalty_points {
            return points;
        }
        let cutoff = on
            .checked_sub_months(Months::new(POINTS_LOOKBACK_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        self.convictions
            .iter()
            .filter(|conviction| conviction.date > cutoff && conviction.date <= on)
            .map(|conviction| conviction.points)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Kilometres per year.
    pub annual_distance: u32,
    pub primary_use: PrimaryUse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking_location: Option<ParkingLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_area: Option<RiskArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conviction {
    pub date: NaiveDate,
    pub code: String,
    pub points: u32,
    #[serde(default)]
    pub fine_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub date: NaiveDate,
    pub loss_type: LossType,
    pub amount: f64,
    pub fault_status: FaultStatus,
    pub settled: bool,
}

/// Cover requested alongside the risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRequest {
    pub cover_level: CoverLevel,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess: Option<f64>,
}

/// Canonical form of a tariff request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub risk: RiskProfile,
    pub coverage: CoverageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
    Lpg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityFeature {
    Alarm,
    Immobiliser,
    Tracking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenceType {
    FullDomestic,
    Provisional,
    International,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    Partnered,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryUse {
    Private,
    Commute,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParkingLocation {
    Garage,
    Driveway,
    Street,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskArea {
    Standard,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverLevel {
    ThirdParty,
    ThirdPartyFireTheft,
    Comprehensive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Annual,
    Quarterly,
    Monthly,
}

impl PaymentFrequency {
    pub fn instalments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Annual => 1,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::Monthly => 12,
        }
    }
}

/// Loss categories keyed by the severity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Collision,
    Theft,
    Vandalism,
    Fire,
    Flood,
    GlassDamage,
    ThirdParty,
    Comprehensive,
    Other,
}

impl LossType {
    pub const ALL: [LossType; 9] = [
        LossType::Collision,
        LossType::Theft,
        LossType::Vandalism,
        LossType::Fire,
        LossType::Flood,
        LossType::GlassDamage,
        LossType::ThirdParty,
        LossType::Comprehensive,
        LossType::Other,
    ];

    /// Label used by the severity table.
    pub fn label(self) -> &'static str {
        match self {
            LossType::Collision => "Collision",
            LossType::Theft => "Theft",
            LossType::Vandalism => "Vandalism",
            LossType::Fire => "Fire",
            LossType::Flood => "Flood",
            LossType::GlassDamage => "Glass Damage",
            LossType::ThirdParty => "Third Party",
            LossType::Comprehensive => "Comprehensive",
            LossType::Other => "Other",
        }
    }

    /// Unknown labels fall back to `Other`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|loss| loss.label().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(LossType::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultStatus {
    AtFault,
    NotAtFault,
    Split,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn driver() -> Driver {
        Driver {
            date_of_birth: date(2004, 6, 15),
            license_issue_date: Some(date(2022, 1, 10)),
            licence_type: Some(LicenceType::FullDomestic),
            occupation: None,
            marital_status: None,
            no_claims_years: 0,
            penalty_points: None,
            convictions: Vec::new(),
            claims_history: Vec::new(),
        }
    }

    #[test]
    fn age_counts_completed_years() {
        let driver = driver();
        assert_eq!(driver.age_on(date(2026, 6, 14)), Some(21));
        assert_eq!(driver.age_on(date(2026, 6, 15)), Some(22));
        assert_eq!(driver.age_on(date(2000, 1, 1)), None);
    }

    #[test]
    fn years_licensed_requires_issue_date() {
        let mut driver = driver();
        assert_eq!(driver.years_licensed_on(date(2026, 1, 10)), Some(4));
        driver.license_issue_date = None;
        assert_eq!(driver.years_licensed_on(date(2026, 1, 10)), None);
    }

    #[test]
    fn outstanding_points_ignore_expired_convictions() {
        let mut driver = driver();
        driver.convictions = vec![
            Conviction {
                date: date(2025, 2, 1),
                code: "SP30".to_string(),
                points: 3,
                fine_amount: 100.0,
            },
            Conviction {
                date: date(2021, 2, 1),
                code: "CU80".to_string(),
                points: 6,
                fine_amount: 200.0,
            },
        ];
        assert_eq!(driver.outstanding_points(date(2026, 6, 1)), 3);

        driver.penalty_points = Some(4);
        assert_eq!(driver.outstanding_points(date(2026, 6, 1)), 4);
    }

    #[test]
    fn unknown_loss_label_falls_back_to_other() {
        assert_eq!(LossType::from_label("glass damage"), LossType::GlassDamage);
        assert_eq!(LossType::from_label("Meteor"), LossType::Other);
    }
}
