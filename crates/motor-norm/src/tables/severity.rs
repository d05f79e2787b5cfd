use crate::canonical::LossType;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const STANDARD_SEVERITY_CSV: &str = include_str!("severity.csv");

/// Vehicle value brackets used as the second severity-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueBracket {
    UpTo5k,
    From5kTo10k,
    From10kTo25k,
    From25kTo50k,
    From50kTo100k,
    Above100k,
}

impl ValueBracket {
    pub const ALL: [ValueBracket; 6] = [
        ValueBracket::UpTo5k,
        ValueBracket::From5kTo10k,
        ValueBracket::From10kTo25k,
        ValueBracket::From25kTo50k,
        ValueBracket::From50kTo100k,
        ValueBracket::Above100k,
    ];

    pub fn for_value(vehicle_value: f64) -> Self {
        match vehicle_value {
            v if v < 5_000.0 => ValueBracket::UpTo5k,
            v if v < 10_000.0 => ValueBracket::From5kTo10k,
            v if v < 25_000.0 => ValueBracket::From10kTo25k,
            v if v < 50_000.0 => ValueBracket::From25kTo50k,
            v if v < 100_000.0 => ValueBracket::From50kTo100k,
            _ => ValueBracket::Above100k,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValueBracket::UpTo5k => "£0-5k",
            ValueBracket::From5kTo10k => "£5k-10k",
            ValueBracket::From10kTo25k => "£10k-25k",
            ValueBracket::From25kTo50k => "£25k-50k",
            ValueBracket::From50kTo100k => "£50k-100k",
            ValueBracket::Above100k => "£100k+",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|bracket| bracket.label() == label.trim())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read severity table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed severity table: {0}")]
    Csv(#[from] csv::Error),
    #[error("severity table row {row}: unknown loss type '{value}'")]
    UnknownLossType { row: usize, value: String },
    #[error("severity table row {row}: unknown value bracket '{value}'")]
    UnknownBracket { row: usize, value: String },
    #[error("severity table row {row}: base amount must be positive")]
    NonPositiveAmount { row: usize },
    #[error("severity table has no entry for {loss} / {bracket}")]
    MissingEntry {
        loss: &'static str,
        bracket: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct SeverityRow {
    loss_type: String,
    value_bracket: String,
    base_amount: f64,
}

/// Base reserve amounts keyed by loss type and vehicle value bracket.
///
/// Loaded once at startup and shared read-only; every loss type must carry an
/// amount for every bracket.
#[derive(Debug, Clone)]
pub struct SeverityTable {
    amounts: HashMap<(LossType, ValueBracket), f64>,
}

impl SeverityTable {
    pub fn standard() -> Result<Self, TableError> {
        Self::from_reader(STANDARD_SEVERITY_CSV.as_bytes())
    }

    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut amounts = HashMap::new();

        for (index, record) in csv_reader.deserialize::<SeverityRow>().enumerate() {
            let row = record?;
            let line = index + 2;
            let loss = LossType::ALL
                .into_iter()
                .find(|loss| loss.label().eq_ignore_ascii_case(row.loss_type.trim()))
                .ok_or_else(|| TableError::UnknownLossType {
                    row: line,
                    value: row.loss_type.clone(),
                })?;
            let bracket = ValueBracket::from_label(&row.value_bracket).ok_or_else(|| {
                TableError::UnknownBracket {
                    row: line,
                    value: row.value_bracket.clone(),
                }
            })?;
            if !(row.base_amount.is_finite() && row.base_amount > 0.0) {
                return Err(TableError::NonPositiveAmount { row: line });
            }
            amounts.insert((loss, bracket), row.base_amount);
        }

        for loss in LossType::ALL {
            for bracket in ValueBracket::ALL {
                if !amounts.contains_key(&(loss, bracket)) {
                    return Err(TableError::MissingEntry {
                        loss: loss.label(),
                        bracket: bracket.label(),
                    });
                }
            }
        }

        Ok(Self { amounts })
    }

    pub fn base_amount(&self, loss: LossType, bracket: ValueBracket) -> Option<f64> {
        self.amounts.get(&(loss, bracket)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_every_key() {
        let table = SeverityTable::standard().expect("embedded table loads");
        assert_eq!(
            table.base_amount(LossType::Collision, ValueBracket::From10kTo25k),
            Some(4_000.0)
        );
        assert_eq!(
            table.base_amount(LossType::ThirdParty, ValueBracket::Above100k),
            Some(35_000.0)
        );
        assert_eq!(
            table.base_amount(LossType::GlassDamage, ValueBracket::UpTo5k),
            Some(200.0)
        );
    }

    #[test]
    fn value_brackets_are_half_open() {
        assert_eq!(ValueBracket::for_value(4_999.99), ValueBracket::UpTo5k);
        assert_eq!(ValueBracket::for_value(5_000.0), ValueBracket::From5kTo10k);
        assert_eq!(ValueBracket::for_value(100_000.0), ValueBracket::Above100k);
    }

    #[test]
    fn incomplete_table_is_rejected() {
        let csv = "loss_type,value_bracket,base_amount\nCollision,£0-5k,1500\n";
        let err = SeverityTable::from_reader(csv.as_bytes()).expect_err("table incomplete");
        assert!(matches!(err, TableError::MissingEntry { .. }));
    }

    #[test]
    fn unknown_labels_are_reported_with_row() {
        let csv = "loss_type,value_bracket,base_amount\nMeteor,£0-5k,1500\n";
        match SeverityTable::from_reader(csv.as_bytes()) {
            Err(TableError::UnknownLossType { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "Meteor");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let csv = "loss_type,value_bracket,base_amount\nTheft,£0-5k,0\n";
        let err = SeverityTable::from_reader(csv.as_bytes()).expect_err("zero rejected");
        assert!(matches!(err, TableError::NonPositiveAmount { row: 2 }));
    }
}
