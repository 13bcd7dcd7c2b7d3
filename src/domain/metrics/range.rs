use super::value_objects::{RangeToken, ResolvedRange, StepUnit};

impl RangeToken {
    pub fn resolve(&self) -> ResolvedRange {
        match self {
            Self::LastHour => ResolvedRange::new(60, StepUnit::Minute),
            Self::LastDay => ResolvedRange::new(24, StepUnit::Hour),
            Self::LastWeek => ResolvedRange::new(7, StepUnit::Day),
            Self::LastMonth => ResolvedRange::new(30, StepUnit::Day),
            Self::LastQuarter => ResolvedRange::new(90, StepUnit::Day),
        }
    }
}

/// Resolve a raw range selector. Unrecognized text resolves to 90 days.
pub fn resolve(raw: &str) -> ResolvedRange {
    RangeToken::parse_lenient(raw).resolve()
}
