//! Per-range series cache with background polling.
//!
//! Each observed [`RangeToken`] owns one cache entry. The first observer
//! gets a synthesized placeholder synchronously and starts a poller; the last
//! observer to leave stops the poller and aborts in-flight fetches. Fetch
//! failures never reach observers.

use crate::application::config::SyncConfig;
use crate::application::runtime::Runtime;
use crate::domain::errors::FetchResult;
use crate::domain::logging::LogComponent;
use crate::domain::metrics::synthesizer::synthesize_shape;
use crate::domain::metrics::{MetricsSource, RangeToken, Series};
use crate::{log_debug, log_info, log_warn};
use chrono::{DateTime, Utc};
use futures::future::{AbortHandle, Abortable, FutureExt};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

const COMPONENT: LogComponent = LogComponent::Application("SyncCache");
/// Poll ticks are skipped while this many fetches of one token are pending
pub const MAX_IN_FLIGHT: usize = 3;

/// What a chart consumer sees for one range
#[derive(Debug, Clone, PartialEq)]
pub struct ChartState {
    pub series: Series,
    /// True until any series, real or synthesized, exists
    pub is_loading: bool,
    /// True while the series is synthesized rather than fetched
    pub is_placeholder: bool,
}

impl ChartState {
    pub fn loading() -> Self {
        Self { series: Series::empty(), is_loading: true, is_placeholder: false }
    }
}

type Listener = Rc<dyn Fn(&ChartState)>;

/// Cache slot of one range token. Never evicted.
#[derive(Default)]
struct CacheEntry {
    series: Option<Series>,
    fetched_at: Option<DateTime<Utc>>,
    is_placeholder: bool,
    delivered: Option<ChartState>,
    listeners: Vec<(u64, Listener)>,
    poller: Option<AbortHandle>,
    in_flight: HashMap<u64, AbortHandle>,
    issued_seq: u64,
    applied_seq: u64,
}

impl CacheEntry {
    fn state(&self) -> ChartState {
        match &self.series {
            Some(series) => ChartState {
                series: series.clone(),
                is_loading: false,
                is_placeholder: self.is_placeholder,
            },
            None => ChartState::loading(),
        }
    }

    fn is_stale(&self, now: DateTime<Utc>, stale_time: Duration) -> bool {
        match self.fetched_at {
            None => true,
            Some(at) => (now - at).to_std().map(|age| age >= stale_time).unwrap_or(false),
        }
    }

    fn listeners(&self) -> Vec<Listener> {
        self.listeners.iter().map(|(_, listener)| listener.clone()).collect()
    }
}

/// Read-only view of a cache slot
#[derive(Debug, Clone, PartialEq)]
pub struct EntryStatus {
    pub series: Option<Series>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
    pub observers: usize,
    pub polling: bool,
    pub in_flight: usize,
}

/// Keeps one observer registered while alive; dropping it unsubscribes.
pub struct Subscription {
    token: RangeToken,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn token(&self) -> RangeToken {
        self.token
    }

    /// Consuming the subscription drops it, which releases the observer.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("token", &self.token).finish()
    }
}

struct CacheInner<S> {
    source: Rc<S>,
    runtime: Rc<dyn Runtime>,
    config: SyncConfig,
    rng: RefCell<Box<dyn RngCore>>,
    entries: RefCell<HashMap<RangeToken, CacheEntry>>,
    next_listener: Cell<u64>,
}

/// Reactive, per-range series cache. Cloning shares the cache.
pub struct SyncCache<S: MetricsSource + 'static> {
    inner: Rc<CacheInner<S>>,
}

impl<S: MetricsSource + 'static> Clone for SyncCache<S> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

/// Builder for [`SyncCache`]
pub struct SyncCacheBuilder<S> {
    source: S,
    runtime: Rc<dyn Runtime>,
    config: SyncConfig,
    rng: Option<Box<dyn RngCore>>,
}

impl<S: MetricsSource + 'static> SyncCacheBuilder<S> {
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Random source for placeholders; seeded from entropy by default.
    pub fn rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn build(self) -> SyncCache<S> {
        let rng = self.rng.unwrap_or_else(|| Box::new(SmallRng::from_entropy()));
        SyncCache {
            inner: Rc::new(CacheInner {
                source: Rc::new(self.source),
                runtime: self.runtime,
                config: self.config,
                rng: RefCell::new(rng),
                entries: RefCell::new(HashMap::new()),
                next_listener: Cell::new(0),
            }),
        }
    }
}

impl<S: MetricsSource + 'static> SyncCache<S> {
    pub fn new(source: S, runtime: Rc<dyn Runtime>) -> Self {
        Self::builder(source, runtime).build()
    }

    pub fn builder(source: S, runtime: Rc<dyn Runtime>) -> SyncCacheBuilder<S> {
        SyncCacheBuilder { source, runtime, config: SyncConfig::default(), rng: None }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Register `on_change` for `token`.
    ///
    /// `on_change` runs once immediately with the current state (a placeholder
    /// on first observation) and again whenever the state's content changes.
    pub fn observe<F>(&self, token: RangeToken, on_change: F) -> Subscription
    where
        F: Fn(&ChartState) + 'static,
    {
        let inner = &self.inner;
        let id = inner.next_listener.get();
        inner.next_listener.set(id + 1);
        let listener: Listener = Rc::new(on_change);

        let (state, first_observer, needs_fetch) = {
            let now = inner.runtime.now();
            let mut entries = inner.entries.borrow_mut();
            let entry = entries.entry(token).or_default();
            let first_observer = entry.listeners.is_empty();
            entry.listeners.push((id, listener.clone()));

            if entry.series.is_none() && inner.config.placeholder {
                entry.series = Some(inner.placeholder(token));
                entry.is_placeholder = true;
            }
            let state = entry.state();
            entry.delivered = Some(state.clone());
            let needs_fetch = entry.in_flight.is_empty() && entry.is_stale(now, inner.config.stale_time());
            (state, first_observer, needs_fetch)
        };

        listener(&state);
        if first_observer {
            CacheInner::start_polling(inner, token);
        }
        if needs_fetch {
            CacheInner::issue_fetch(inner, token);
        } else {
            log_debug!(COMPONENT, "♻️ Reusing cached {} series", token);
        }

        let weak = Rc::downgrade(inner);
        Subscription {
            token,
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.release(token, id);
                }
            })),
        }
    }

    /// Latest state for `token`, if it was ever observed.
    pub fn snapshot(&self, token: RangeToken) -> Option<ChartState> {
        self.inner.entries.borrow().get(&token).map(CacheEntry::state)
    }

    pub fn entry_status(&self, token: RangeToken) -> Option<EntryStatus> {
        let now = self.inner.runtime.now();
        let stale_time = self.inner.config.stale_time();
        self.inner.entries.borrow().get(&token).map(|entry| EntryStatus {
            series: entry.series.clone(),
            fetched_at: entry.fetched_at,
            is_stale: entry.is_stale(now, stale_time),
            observers: entry.listeners.len(),
            polling: entry.poller.is_some(),
            in_flight: entry.in_flight.len(),
        })
    }

    /// Window regained focus. Refetches only when enabled in the config.
    pub fn on_window_focus(&self, token: RangeToken) {
        let inner = &self.inner;
        if !inner.config.refetch_on_window_focus {
            return;
        }
        let should_fetch = {
            let now = inner.runtime.now();
            let entries = inner.entries.borrow();
            entries.get(&token).is_some_and(|entry| {
                !entry.listeners.is_empty()
                    && entry.in_flight.is_empty()
                    && entry.is_stale(now, inner.config.stale_time())
            })
        };
        if should_fetch {
            CacheInner::issue_fetch(inner, token);
        }
    }
}

impl<S: MetricsSource + 'static> CacheInner<S> {
    fn placeholder(&self, token: RangeToken) -> Series {
        let now = self.runtime.now();
        let mut rng = self.rng.borrow_mut();
        synthesize_shape(self.config.shape, token.resolve(), now, &mut **rng)
    }

    fn start_polling(inner: &Rc<Self>, token: RangeToken) {
        let (handle, registration) = AbortHandle::new_pair();
        let weak = Rc::downgrade(inner);
        let interval = inner.config.poll_interval();
        if interval.is_zero() {
            log_warn!(COMPONENT, "⚠️ Zero poll interval, {} will not poll", token);
            return;
        }
        let ticks = async move {
            loop {
                let Some(sleep) = weak.upgrade().map(|inner| inner.runtime.sleep(interval)) else {
                    break;
                };
                sleep.await;
                match weak.upgrade() {
                    Some(inner) => CacheInner::issue_fetch(&inner, token),
                    None => break,
                }
            }
        };
        inner.runtime.spawn(Abortable::new(ticks, registration).map(|_| ()).boxed_local());
        if let Some(entry) = inner.entries.borrow_mut().get_mut(&token) {
            entry.poller = Some(handle);
        }
        log_info!(COMPONENT, "⏱️ Polling {} every {:?}", token, interval);
    }

    fn issue_fetch(inner: &Rc<Self>, token: RangeToken) {
        let (seq, registration) = {
            let mut entries = inner.entries.borrow_mut();
            let Some(entry) = entries.get_mut(&token) else {
                return;
            };
            if entry.listeners.is_empty() {
                return;
            }
            if entry.in_flight.len() >= MAX_IN_FLIGHT {
                log_debug!(COMPONENT, "⏭️ Skipping fetch for {}: {} still in flight", token, entry.in_flight.len());
                return;
            }
            entry.issued_seq += 1;
            let seq = entry.issued_seq;
            let (handle, registration) = AbortHandle::new_pair();
            entry.in_flight.insert(seq, handle);
            (seq, registration)
        };
        log_debug!(COMPONENT, "📡 Fetch #{} for {}", seq, token);

        let source = Rc::clone(&inner.source);
        let weak = Rc::downgrade(inner);
        let task = async move {
            let result = source.fetch(token).await;
            if let Some(inner) = weak.upgrade() {
                inner.settle(token, seq, result);
            }
        };
        inner.runtime.spawn(Abortable::new(task, registration).map(|_| ()).boxed_local());
    }

    fn settle(&self, token: RangeToken, seq: u64, result: FetchResult<Series>) {
        let notify = {
            let now = self.runtime.now();
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.get_mut(&token) else {
                return;
            };
            entry.in_flight.remove(&seq);
            if entry.listeners.is_empty() {
                return;
            }

            match result {
                Ok(series) if seq > entry.applied_seq => {
                    entry.applied_seq = seq;
                    // Older fetches can no longer be applied.
                    entry.in_flight.retain(|pending, fetch| {
                        let keep = *pending > seq;
                        if !keep {
                            fetch.abort();
                        }
                        keep
                    });
                    entry.fetched_at = Some(now);
                    entry.is_placeholder = false;
                    // Keep the delivered buffer when content is unchanged.
                    let unchanged = entry.series.as_ref().is_some_and(|prev| *prev == series);
                    if !unchanged {
                        entry.series = Some(series);
                    }
                }
                Ok(_) => {
                    log_debug!(
                        COMPONENT,
                        "🗑️ Dropping fetch #{} for {}: #{} already applied",
                        seq,
                        token,
                        entry.applied_seq
                    );
                    return;
                }
                Err(err) => {
                    log_warn!(COMPONENT, "⚠️ Fetch #{} for {} failed, keeping last series: {}", seq, token, err);
                    if entry.series.is_none() {
                        entry.series = Some(self.placeholder(token));
                        entry.is_placeholder = true;
                    }
                }
            }

            let state = entry.state();
            if entry.delivered.as_ref() == Some(&state) {
                None
            } else {
                entry.delivered = Some(state.clone());
                Some((state, entry.listeners()))
            }
        };

        if let Some((state, listeners)) = notify {
            for listener in listeners {
                listener(&state);
            }
        }
    }

    fn release(&self, token: RangeToken, id: u64) {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get_mut(&token) else {
            return;
        };
        entry.listeners.retain(|(listener_id, _)| *listener_id != id);
        if !entry.listeners.is_empty() {
            return;
        }
        if let Some(poller) = entry.poller.take() {
            poller.abort();
            log_info!(COMPONENT, "⏹️ Stopped polling {}", token);
        }
        for (_, fetch) in entry.in_flight.drain() {
            fetch.abort();
        }
    }
}
