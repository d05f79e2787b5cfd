use crate::canonical::{round_money, FraudIndicator, FraudLevel};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAssessment {
    pub score: f64,
    pub level: FraudLevel,
    pub indicators: Vec<FraudIndicator>,
    pub descriptions: Vec<&'static str>,
    pub recommendation: &'static str,
}

/// Weighted scoring over reported fraud indicators.
#[derive(Debug, Default, Clone, Copy)]
pub struct FraudScorer;

impl FraudScorer {
    pub fn weight(indicator: FraudIndicator) -> f64 {
        match indicator {
            FraudIndicator::LateReporting => 0.30,
            FraudIndicator::MultipleClaims => 0.40,
            FraudIndicator::HighValueForType => 0.25,
            FraudIndicator::InconsistentStory => 0.50,
            FraudIndicator::NoPoliceReport => 0.20,
            FraudIndicator::SuspiciousTiming => 0.35,
            FraudIndicator::UnusualLocation => 0.15,
            FraudIndicator::PriorFraudHistory => 0.80,
        }
    }

    fn description(indicator: FraudIndicator) -> &'static str {
        match indicator {
            FraudIndicator::LateReporting => "Late claim reporting (>7 days)",
            FraudIndicator::MultipleClaims => "Multiple recent claims",
            FraudIndicator::HighValueForType => "Unusually high claim value",
            FraudIndicator::InconsistentStory => "Inconsistent incident description",
            FraudIndicator::NoPoliceReport => "No police report for significant incident",
            FraudIndicator::SuspiciousTiming => "Incident shortly after cover started or changed",
            FraudIndicator::UnusualLocation => "Incident far from usual area of use",
            FraudIndicator::PriorFraudHistory => "Prior confirmed fraud on record",
        }
    }

    pub fn level_for(score: f64) -> FraudLevel {
        match score {
            s if s >= 0.8 => FraudLevel::High,
            s if s >= 0.5 => FraudLevel::Medium,
            s if s >= 0.2 => FraudLevel::Low,
            _ => FraudLevel::Minimal,
        }
    }

    pub fn recommendation(level: FraudLevel) -> &'static str {
        match level {
            FraudLevel::High => {
                "IMMEDIATE INVESTIGATION REQUIRED - Refer to Special Investigation Unit (SIU)"
            }
            FraudLevel::Medium => {
                "ENHANCED REVIEW - Additional documentation and verification required"
            }
            FraudLevel::Low => "STANDARD PROCESSING - Monitor for additional indicators",
            FraudLevel::Minimal => "NORMAL PROCESSING - No additional fraud concerns identified",
        }
    }

    /// Duplicate indicators count once.
    pub fn assess(&self, reported: &[FraudIndicator]) -> FraudAssessment {
        let mut indicators = reported.to_vec();
        indicators.sort();
        indicators.dedup();

        let score = round_money(indicators.iter().copied().map(Self::weight).sum());
        let level = Self::level_for(score);

        FraudAssessment {
            score,
            level,
            descriptions: indicators.iter().copied().map(Self::description).collect(),
            indicators,
            recommendation: Self::recommendation(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_indicators_is_minimal() {
        let assessment = FraudScorer.assess(&[]);
        assert_eq!(assessment.score, 0.0);
        assert_eq!(assessment.level, FraudLevel::Minimal);
    }

    #[test]
    fn weights_accumulate_into_levels() {
        let assessment = FraudScorer.assess(&[
            FraudIndicator::LateReporting,
            FraudIndicator::NoPoliceReport,
        ]);
        assert_eq!(assessment.score, 0.5);
        assert_eq!(assessment.level, FraudLevel::Medium);
        assert_eq!(assessment.descriptions.len(), 2);
    }

    #[test]
    fn duplicates_are_scored_once() {
        let assessment = FraudScorer.assess(&[
            FraudIndicator::UnusualLocation,
            FraudIndicator::UnusualLocation,
        ]);
        assert_eq!(assessment.score, 0.15);
        assert_eq!(assessment.level, FraudLevel::Minimal);
    }

    #[test]
    fn prior_history_alone_is_high() {
        let assessment = FraudScorer.assess(&[FraudIndicator::PriorFraudHistory]);
        assert_eq!(assessment.level, FraudLevel::High);
        assert!(assessment.recommendation.starts_with("IMMEDIATE"));
    }
}
