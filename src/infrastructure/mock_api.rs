//! Stand-in for the metrics backend: `GET /api/metrics?timeRange=..`.

use crate::application::runtime::Runtime;
use crate::domain::errors::FetchResult;
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::metrics::synthesizer::synthesize_shape;
use crate::domain::metrics::{ChannelShape, RangeToken, MetricsSource, Series};
use crate::infrastructure::http::MetricsResponse;
use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use url::form_urlencoded;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Latency injected before every mock response
pub const SIMULATED_LATENCY: Duration = Duration::from_millis(200);
/// Range used when the request has no `timeRange`
pub const DEFAULT_TIME_RANGE: &str = "3m";

/// Percent-decoded `timeRange` value of a query string such as `timeRange=7d&x=1`.
pub fn time_range_param(query: &str) -> Cow<'_, str> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "timeRange")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .unwrap_or(Cow::Borrowed(DEFAULT_TIME_RANGE))
}

/// Response body for a request query.
pub fn metrics_response<R: Rng + ?Sized>(
    query: &str,
    shape: ChannelShape,
    now: DateTime<Utc>,
    rng: &mut R,
) -> MetricsResponse {
    let range = RangeToken::parse_lenient(&time_range_param(query)).resolve();
    MetricsResponse { data: synthesize_shape(shape, range, now, rng) }
}

pub fn metrics_response_json<R: Rng + ?Sized>(
    query: &str,
    shape: ChannelShape,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&metrics_response(query, shape, now, rng))
}

/// Metrics source answering from the mock backend after the simulated latency.
pub struct SyntheticMetricsSource {
    runtime: Rc<dyn Runtime>,
    latency: Duration,
    shape: ChannelShape,
    rng: RefCell<SmallRng>,
}

impl SyntheticMetricsSource {
    pub fn new(runtime: Rc<dyn Runtime>) -> Self {
        Self {
            runtime,
            latency: SIMULATED_LATENCY,
            shape: ChannelShape::Balance,
            rng: RefCell::new(SmallRng::from_entropy()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_shape(mut self, shape: ChannelShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RefCell::new(SmallRng::seed_from_u64(seed));
        self
    }
}

impl MetricsSource for SyntheticMetricsSource {
    async fn fetch(&self, token: RangeToken) -> FetchResult<Series> {
        self.runtime.sleep(self.latency).await;
        let query = format!("timeRange={}", token.as_param());
        let response = metrics_response(&query, self.shape, self.runtime.now(), &mut *self.rng.borrow_mut());
        get_logger().trace(
            LogComponent::Infrastructure("MockApi"),
            &format!("🧪 Served {} synthetic samples for {}", response.data.len(), token),
        );
        Ok(response.data)
    }
}
