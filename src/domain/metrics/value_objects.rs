use chrono::{DateTime, Duration, Utc};
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

/// Value Object - selectable time window of a chart
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum RangeToken {
    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    LastHour,

    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    LastDay,

    #[strum(serialize = "7d")]
    #[serde(rename = "7d")]
    LastWeek,

    #[strum(serialize = "30d")]
    #[serde(rename = "30d")]
    LastMonth,

    /// Quarterly view, also spelled "3m"
    #[default]
    #[strum(to_string = "90d", serialize = "3m")]
    #[serde(rename = "90d", alias = "3m")]
    LastQuarter,
}

impl RangeToken {
    /// Parse a raw selector. Unknown text falls back to the quarterly view.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn as_param(&self) -> &str {
        self.as_ref()
    }
}

/// Spacing between consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepUnit {
    #[display(fmt = "minute")]
    Minute,
    #[display(fmt = "hour")]
    Hour,
    #[display(fmt = "day")]
    Day,
}

impl StepUnit {
    pub fn step(&self) -> Duration {
        match self {
            Self::Minute => Duration::minutes(1),
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
        }
    }
}

/// Sample count and spacing a range token resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub count: usize,
    pub unit: StepUnit,
}

impl ResolvedRange {
    /// Wall-clock span from the oldest to the newest sample.
    pub fn span(&self) -> Duration {
        self.unit.step() * (self.count.saturating_sub(1) as i32)
    }
}

/// Which value channels a chart carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelShape {
    /// One `balance` channel (funds in use, sales ledger)
    #[default]
    #[strum(serialize = "balance")]
    Balance,
    /// Independent `desktop` / `mobile` pair
    #[strum(serialize = "traffic")]
    Traffic,
}

/// Value Object - channel values of one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Balance { balance: f64 },
    Traffic { desktop: u32, mobile: u32 },
}

impl Reading {
    pub fn shape(&self) -> ChannelShape {
        match self {
            Reading::Balance { .. } => ChannelShape::Balance,
            Reading::Traffic { .. } => ChannelShape::Traffic,
        }
    }

    /// Height of the stacked area at this sample.
    pub fn total(&self) -> f64 {
        match *self {
            Reading::Balance { balance } => balance,
            Reading::Traffic { desktop, mobile } => f64::from(desktop) + f64::from(mobile),
        }
    }
}

/// Value Object - one timestamped point; serialized as `{"date": .., <channels>}`
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: Reading,
}

impl Sample {
    pub fn balance(timestamp: DateTime<Utc>, balance: f64) -> Self {
        Self::new(timestamp, Reading::Balance { balance })
    }

    pub fn traffic(timestamp: DateTime<Utc>, desktop: u32, mobile: u32) -> Self {
        Self::new(timestamp, Reading::Traffic { desktop, mobile })
    }

    pub fn value(&self) -> f64 {
        self.reading.total()
    }
}
