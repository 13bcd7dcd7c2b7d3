use crate::domain::metrics::{ChannelShape, RangeToken};
use derive_more::Display;
use strum::{AsRefStr, EnumIter, EnumString};

/// Value Object - which metric a chart card shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, AsRefStr)]
pub enum ChartKind {
    #[display(fmt = "Funds in Use")]
    #[strum(serialize = "funds-in-use")]
    FundsInUse,
    #[display(fmt = "Sales Ledger")]
    #[strum(serialize = "sales-ledger")]
    SalesLedger,
}

impl ChartKind {
    pub fn title(&self) -> String {
        self.to_string()
    }

    pub fn shape(&self) -> ChannelShape {
        ChannelShape::Balance
    }
}

/// Order of the range picker entries
pub const RANGE_OPTIONS: [RangeToken; 5] = [
    RangeToken::LastQuarter,
    RangeToken::LastMonth,
    RangeToken::LastWeek,
    RangeToken::LastDay,
    RangeToken::LastHour,
];

impl RangeToken {
    /// Picker label and card subtitle
    pub fn description(&self) -> &'static str {
        match self {
            Self::LastHour => "Last hour",
            Self::LastDay => "Last 24 hours",
            Self::LastWeek => "Last 7 days",
            Self::LastMonth => "Last 30 days",
            Self::LastQuarter => "Last 3 months",
        }
    }

    /// Narrow screens open on a week, wide ones on a quarter.
    pub fn default_for_device(is_mobile: bool) -> Self {
        if is_mobile { Self::LastWeek } else { Self::LastQuarter }
    }
}

/// Subtitle for a raw selector; unknown selectors read as the quarter.
pub fn describe_range(raw: &str) -> &'static str {
    RangeToken::parse_lenient(raw).description()
}

/// Value Object - inclusive Y-axis bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDomain {
    pub min: f64,
    pub max: f64,
}

impl AxisDomain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}
