use crate::domain::chart::AxisDomain;
use crate::domain::metrics::{RangeToken, Series};
use chrono::{DateTime, Utc};

/// Grid step the Y axis snaps to
const AXIS_STEP: f64 = 1000.0;
/// Padding used when every value is equal
const FLAT_PADDING: f64 = 1000.0;

/// Domain service deriving display scales from a series
pub struct ChartScaleService;

impl ChartScaleService {
    /// Y-axis bounds padded by 10% of the value spread and snapped outward
    /// to the nearest thousand. `None` for an empty series.
    pub fn y_axis_domain(series: &Series) -> Option<AxisDomain> {
        let (min, max) = series.value_range()?;
        let spread_padding = (max - min) * 0.1;
        let padding = if spread_padding == 0.0 { FLAT_PADDING } else { spread_padding };
        Some(AxisDomain::new(
            ((min - padding) / AXIS_STEP).floor() * AXIS_STEP,
            ((max + padding) / AXIS_STEP).ceil() * AXIS_STEP,
        ))
    }
}

/// Domain service formatting axis and tooltip labels
pub struct ChartLabelService;

impl ChartLabelService {
    /// `"3:05 PM"` on the hourly view, `"Jan 5"` otherwise. Labels are UTC.
    pub fn format_tick(range: RangeToken, timestamp: DateTime<Utc>) -> String {
        match range {
            RangeToken::LastHour => timestamp.format("%-I:%M %p").to_string(),
            _ => timestamp.format("%b %-d").to_string(),
        }
    }

    /// Card subtitle on wide layouts
    pub fn card_description(range: RangeToken, override_text: Option<&str>) -> String {
        match override_text {
            Some(text) => text.to_string(),
            None => format!("Total for the {}", range.description()),
        }
    }
}
