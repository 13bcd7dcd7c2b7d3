//! Runtime implementations: browser timers and a manually advanced clock.

use crate::application::runtime::Runtime;
use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

/// UI-thread runtime backed by `setTimeout` and the JS microtask queue
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        gloo_timers::future::sleep(duration).boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

struct ClockState {
    now: DateTime<Utc>,
    next_timer: u64,
    timers: BTreeMap<(DateTime<Utc>, u64), oneshot::Sender<()>>,
}

/// Deterministic runtime: time moves only through [`ManualRuntime::advance`].
///
/// Timers fire in deadline order and every spawned task runs until it stalls
/// before the clock moves on.
pub struct ManualRuntime {
    clock: RefCell<ClockState>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl ManualRuntime {
    pub fn new(start: DateTime<Utc>) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            clock: RefCell::new(ClockState { now: start, next_timer: 0, timers: BTreeMap::new() }),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// Run every ready task without moving the clock.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Move the clock forward, firing due timers in order.
    pub fn advance(&self, by: Duration) {
        let target = self.clock.borrow().now + to_delta(by);
        loop {
            self.run_until_stalled();
            let Some(timer) = self.pop_due(target) else {
                break;
            };
            let _ = timer.send(());
        }
        self.clock.borrow_mut().now = target;
        self.run_until_stalled();
    }

    pub fn pending_timers(&self) -> usize {
        self.clock.borrow().timers.values().filter(|tx| !tx.is_canceled()).count()
    }

    fn pop_due(&self, target: DateTime<Utc>) -> Option<oneshot::Sender<()>> {
        let mut clock = self.clock.borrow_mut();
        let key = *clock.timers.keys().next()?;
        if key.0 > target {
            return None;
        }
        clock.now = clock.now.max(key.0);
        clock.timers.remove(&key)
    }
}

impl Runtime for ManualRuntime {
    fn now(&self) -> DateTime<Utc> {
        self.clock.borrow().now
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let (tx, rx) = oneshot::channel();
        let mut clock = self.clock.borrow_mut();
        let deadline = clock.now + to_delta(duration);
        let id = clock.next_timer;
        clock.next_timer += 1;
        clock.timers.insert((deadline, id), tx);
        async move {
            let _ = rx.await;
        }
        .boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        // Spawning only fails after the pool is dropped, and the pool lives
        // as long as the runtime.
        let _ = self.spawner.spawn_local(task);
    }
}

fn to_delta(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
