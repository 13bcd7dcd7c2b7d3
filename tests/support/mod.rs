#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use ledger_chart_sync::application::{ChartState, Runtime, SyncCache, SyncConfig};
use ledger_chart_sync::domain::errors::{FetchResult, TransportError};
use ledger_chart_sync::domain::metrics::{MetricsSource, RangeToken, Sample, Series};
use ledger_chart_sync::infrastructure::ManualRuntime;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

type Responder = Box<dyn Fn(RangeToken, usize) -> (Duration, FetchResult<Series>)>;

/// Source whose replies come from a closure of `(token, call index)`.
pub struct ScriptedSource {
    runtime: Rc<ManualRuntime>,
    calls: RefCell<Vec<RangeToken>>,
    respond: Responder,
}

impl ScriptedSource {
    pub fn new<F>(runtime: Rc<ManualRuntime>, respond: F) -> Self
    where
        F: Fn(RangeToken, usize) -> (Duration, FetchResult<Series>) + 'static,
    {
        Self { runtime, calls: RefCell::new(Vec::new()), respond: Box::new(respond) }
    }

    /// Every call answers `series` after `latency`.
    pub fn constant(runtime: Rc<ManualRuntime>, latency: Duration, series: Series) -> Self {
        Self::new(runtime, move |_, _| (latency, Ok(series.clone())))
    }

    pub fn failing(runtime: Rc<ManualRuntime>, latency: Duration) -> Self {
        Self::new(runtime, move |_, _| (latency, Err(TransportError::Network("connection refused".into()))))
    }

    pub fn calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls_for(&self, token: RangeToken) -> usize {
        self.calls.borrow().iter().filter(|t| **t == token).count()
    }
}

impl MetricsSource for ScriptedSource {
    async fn fetch(&self, token: RangeToken) -> FetchResult<Series> {
        let call = {
            let mut calls = self.calls.borrow_mut();
            calls.push(token);
            calls.len() - 1
        };
        let (latency, result) = (self.respond)(token, call);
        self.runtime.sleep(latency).await;
        result
    }
}

/// Daily balance series of `count` samples ending at `start()`, all equal to `value`.
pub fn flat_series(count: usize, value: f64) -> Series {
    let samples = (0..count)
        .rev()
        .map(|i| Sample::balance(start() - chrono::Duration::days(i as i64), value))
        .collect();
    Series::new(samples).unwrap()
}

pub fn cache_with(
    runtime: &Rc<ManualRuntime>,
    source: ScriptedSource,
    config: SyncConfig,
) -> SyncCache<ScriptedSource> {
    let port: Rc<dyn Runtime> = runtime.clone();
    SyncCache::builder(source, port).config(config).rng(SmallRng::seed_from_u64(9)).build()
}

/// Collects every state a listener receives.
#[derive(Clone, Default)]
pub struct Recorder {
    states: Rc<RefCell<Vec<ChartState>>>,
}

impl Recorder {
    pub fn listener(&self) -> impl Fn(&ChartState) + 'static {
        let states = Rc::clone(&self.states);
        move |state| states.borrow_mut().push(state.clone())
    }

    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn last(&self) -> ChartState {
        self.states.borrow().last().cloned().expect("listener never ran")
    }

    pub fn all(&self) -> Vec<ChartState> {
        self.states.borrow().clone()
    }
}
