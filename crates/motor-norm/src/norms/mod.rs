//! Interchange standards, their message shapes and their rule sets.

pub mod bipro;
pub mod gdv;
mod message;
pub mod sivi;
pub mod validation;

pub use message::{
    BiproFlavour, BiproRequest, Credentials, LegacyRequest, MessageBody, MessageHeader,
    ResponseStatus, Severity, SiviRequest, StandardRequest, StandardResponse, UsernameToken,
    WireError,
};
pub use validation::{ValidationCode, ValidationContext, ValidationError};

use crate::tables::Market;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Header naming the standard of an inbound payload.
pub const STANDARD_HEADER: &str = "x-norm-standard";
/// Header naming the standard version; overrides the version in the message.
pub const VERSION_HEADER: &str = "x-norm-version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormStandard {
    BiproRclassic,
    BiproRnext,
    SiviAfs,
    Gdv,
}

/// Wire encoding used by a standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Soap,
    Json,
    FixedWidth,
}

/// Standards sharing one vocabulary share mapping tables and validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormFamily {
    Bipro,
    Sivi,
    Gdv,
}

impl NormStandard {
    pub const ALL: [NormStandard; 4] = [
        NormStandard::BiproRclassic,
        NormStandard::BiproRnext,
        NormStandard::SiviAfs,
        NormStandard::Gdv,
    ];

    pub fn id(self) -> &'static str {
        match self {
            NormStandard::BiproRclassic => "bipro-rclassic",
            NormStandard::BiproRnext => "bipro-rnext",
            NormStandard::SiviAfs => "sivi-afs",
            NormStandard::Gdv => "gdv",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            NormStandard::BiproRclassic => "BiPRO RClassic",
            NormStandard::BiproRnext => "BiPRO RNext",
            NormStandard::SiviAfs => "SIVI AFS",
            NormStandard::Gdv => "GDV",
        }
    }

    pub fn supported_versions(self) -> &'static [&'static str] {
        match self {
            NormStandard::BiproRclassic => &["2024.1", "2023.2"],
            NormStandard::BiproRnext => &["RNext.2024.1"],
            NormStandard::SiviAfs => &["2024.1"],
            NormStandard::Gdv => &["2018"],
        }
    }

    /// Version stamped on outbound messages.
    pub fn current_version(self) -> &'static str {
        self.supported_versions()[0]
    }

    pub fn supports_version(self, version: &str) -> bool {
        self.supported_versions().contains(&version.trim())
    }

    pub fn wire_format(self) -> WireFormat {
        match self {
            NormStandard::BiproRclassic => WireFormat::Soap,
            NormStandard::BiproRnext | NormStandard::SiviAfs => WireFormat::Json,
            NormStandard::Gdv => WireFormat::FixedWidth,
        }
    }

    pub fn family(self) -> NormFamily {
        match self {
            NormStandard::BiproRclassic | NormStandard::BiproRnext => NormFamily::Bipro,
            NormStandard::SiviAfs => NormFamily::Sivi,
            NormStandard::Gdv => NormFamily::Gdv,
        }
    }

    pub fn market(self) -> Market {
        match self.family() {
            NormFamily::Bipro | NormFamily::Gdv => Market::Germany,
            NormFamily::Sivi => Market::Netherlands,
        }
    }
}

impl fmt::Display for NormStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown norm standard '{0}'")]
pub struct UnknownStandard(pub String);

impl FromStr for NormStandard {
    type Err = UnknownStandard;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        NormStandard::ALL
            .into_iter()
            .find(|standard| standard.id() == wanted)
            .ok_or_else(|| UnknownStandard(raw.trim().to_string()))
    }
}

/// Business operation carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Tariff,
    Reserve,
    Transfer,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Tariff => "tariff",
            Operation::Reserve => "reserve",
            Operation::Transfer => "transfer",
        }
    }

    /// Quotes and reserve estimates may be retried by callers; transfers may not.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Operation::Transfer)
    }

    /// Accepts the operation names used across the standards.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tariff" | "tarif" | "quote" | "offerte" => Some(Operation::Tariff),
            "reserve" | "reservierung" | "schade" | "claim" => Some(Operation::Reserve),
            "transfer" => Some(Operation::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic checks for one family of standards.
pub trait NormValidator: Send + Sync {
    /// Every violated rule, in rule order. An empty list means the request may
    /// proceed.
    fn validate(
        &self,
        request: &StandardRequest,
        version: &str,
        context: &ValidationContext,
    ) -> Vec<ValidationError>;
}

/// Validator for a standard's family.
pub fn validator_for(standard: NormStandard) -> &'static dyn NormValidator {
    match standard.family() {
        NormFamily::Bipro => &bipro::BiproValidator,
        NormFamily::Sivi => &sivi::SiviValidator,
        NormFamily::Gdv => &gdv::GdvValidator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standards_parse_from_their_ids() {
        for standard in NormStandard::ALL {
            assert_eq!(standard.id().parse::<NormStandard>(), Ok(standard));
        }
        assert_eq!(" SIVI-AFS ".parse::<NormStandard>(), Ok(NormStandard::SiviAfs));
        assert!("acord".parse::<NormStandard>().is_err());
    }

    #[test]
    fn markets_follow_the_standard_family() {
        assert_eq!(NormStandard::BiproRnext.market(), Market::Germany);
        assert_eq!(NormStandard::Gdv.market(), Market::Germany);
        assert_eq!(NormStandard::SiviAfs.market(), Market::Netherlands);
    }

    #[test]
    fn only_transfers_are_not_idempotent() {
        assert!(Operation::Tariff.is_idempotent());
        assert!(Operation::Reserve.is_idempotent());
        assert!(!Operation::Transfer.is_idempotent());
        assert_eq!(Operation::parse("Schade"), Some(Operation::Reserve));
        assert_eq!(Operation::parse("TARIFF"), Some(Operation::Tariff));
    }
}
