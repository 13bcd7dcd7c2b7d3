pub use super::value_objects::{ChannelShape, Reading, Sample};
use crate::domain::errors::SeriesError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;
use std::sync::Arc;

/// Domain entity - an immutable, time-ordered run of samples.
///
/// Cloning shares the sample buffer; equality compares content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    samples: Arc<Vec<Sample>>,
}

impl Series {
    /// Build a series, checking order and channel shape.
    pub fn new(samples: Vec<Sample>) -> Result<Self, SeriesError> {
        Self::validate(&samples)?;
        Ok(Self { samples: Arc::new(samples) })
    }

    /// Skips validation; callers generate samples in order.
    pub(crate) fn from_ordered(samples: Vec<Sample>) -> Self {
        debug_assert!(Self::validate(&samples).is_ok());
        Self { samples: Arc::new(samples) }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn validate(samples: &[Sample]) -> Result<(), SeriesError> {
        let Some(first) = samples.first() else {
            return Ok(());
        };
        let shape = first.reading.shape();
        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].reading.shape() != shape {
                return Err(SeriesError::MixedShape { index: index + 1 });
            }
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NonIncreasing { index: index + 1 });
            }
        }
        Ok(())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn shape(&self) -> Option<ChannelShape> {
        self.samples.first().map(|s| s.reading.shape())
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Lowest and highest stacked value
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.samples.iter().map(Sample::value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// True when both handles point at the same buffer.
    pub fn shares_buffer(&self, other: &Series) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

impl Deref for Series {
    type Target = [Sample];

    fn deref(&self) -> &[Sample] {
        &self.samples
    }
}

impl Serialize for Series {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.samples.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Series {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let samples = Vec::<Sample>::deserialize(deserializer)?;
        Series::new(samples).map_err(serde::de::Error::custom)
    }
}
