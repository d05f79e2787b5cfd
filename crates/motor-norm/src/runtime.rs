use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current instant; injected so pipelines stay deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_midnight(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Issues identifiers that are never reused within the process lifetime.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, kind: IdKind) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Message,
    Transfer,
    Session,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            IdKind::Message => "MSG",
            IdKind::Transfer => "TRF",
            IdKind::Session => "SES",
        }
    }
}

/// Monotonic counter shared by every id kind, scoped by a node prefix.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    node: String,
    sequence: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            sequence: AtomicU64::new(1),
        }
    }
}

impl Default for SequenceIdGenerator {
    fn default() -> Self {
        Self::new("MN")
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self, kind: IdKind) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{id:08}", self.node, kind.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sequence_ids_are_unique_across_kinds() {
        let ids = SequenceIdGenerator::new("T");
        let issued: HashSet<String> = (0..50)
            .flat_map(|_| [ids.next_id(IdKind::Message), ids.next_id(IdKind::Session)])
            .collect();
        assert_eq!(issued.len(), 100);
    }

    #[test]
    fn sequence_ids_carry_node_and_kind() {
        let ids = SequenceIdGenerator::new("NODE");
        assert_eq!(ids.next_id(IdKind::Transfer), "NODE-TRF-00000001");
        assert_eq!(ids.next_id(IdKind::Message), "NODE-MSG-00000002");
    }

    #[test]
    fn fixed_clock_reports_its_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");
        let clock = FixedClock::at_midnight(date);
        assert_eq!(clock.today(), date);
    }
}
