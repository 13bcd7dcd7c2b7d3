use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use std::time::Duration;

/// Single-threaded scheduling port the sync cache runs on.
///
/// The browser build uses UI-thread timers; tests use a virtual clock.
pub trait Runtime {
    fn now(&self) -> DateTime<Utc>;

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;

    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}
