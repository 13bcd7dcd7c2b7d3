use crate::application::sync_cache::{ChartState, Subscription, SyncCache};
use crate::domain::metrics::{MetricsSource, RangeToken};
use std::rc::Rc;

/// Single-consumer view of the cache: one chart, one selected range.
///
/// Selecting a new range drops the old subscription before observing the new
/// one, so the previous range stops polling unless observed elsewhere.
pub struct ChartFeed<S: MetricsSource + 'static> {
    cache: SyncCache<S>,
    on_change: Rc<dyn Fn(RangeToken, &ChartState)>,
    current: Option<Subscription>,
}

impl<S: MetricsSource + 'static> ChartFeed<S> {
    pub fn new<F>(cache: SyncCache<S>, on_change: F) -> Self
    where
        F: Fn(RangeToken, &ChartState) + 'static,
    {
        Self { cache, on_change: Rc::new(on_change), current: None }
    }

    pub fn select(&mut self, token: RangeToken) {
        if self.range() == Some(token) {
            return;
        }
        self.current = None;
        let on_change = Rc::clone(&self.on_change);
        self.current = Some(self.cache.observe(token, move |state| on_change(token, state)));
    }

    pub fn range(&self) -> Option<RangeToken> {
        self.current.as_ref().map(Subscription::token)
    }

    pub fn state(&self) -> Option<ChartState> {
        self.range().and_then(|token| self.cache.snapshot(token))
    }

    pub fn focus(&self) {
        if let Some(token) = self.range() {
            self.cache.on_window_focus(token);
        }
    }

    /// Stop observing; the cached entry stays for a later `select`.
    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn cache(&self) -> &SyncCache<S> {
        &self.cache
    }
}
