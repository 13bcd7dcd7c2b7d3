use crate::domain::errors::FetchResult;
use crate::domain::metrics::{RangeToken, Series};
use std::rc::Rc;

/// Remote source of metric series.
///
/// Implementations fail with `TransportError` and never retry; the sync
/// cache's polling cadence is the retry policy.
#[allow(async_fn_in_trait)]
pub trait MetricsSource {
    async fn fetch(&self, token: RangeToken) -> FetchResult<Series>;
}

impl<S: MetricsSource> MetricsSource for Rc<S> {
    async fn fetch(&self, token: RangeToken) -> FetchResult<Series> {
        (**self).fetch(token).await
    }
}
