mod support;

use ledger_chart_sync::application::SyncConfig;
use ledger_chart_sync::application::sync_cache::MAX_IN_FLIGHT;
use ledger_chart_sync::domain::errors::TransportError;
use ledger_chart_sync::domain::metrics::RangeToken;
use ledger_chart_sync::infrastructure::ManualRuntime;
use std::rc::Rc;
use support::*;

fn runtime() -> Rc<ManualRuntime> {
    Rc::new(ManualRuntime::new(start()))
}

#[test]
fn first_observer_gets_placeholder_synchronously() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(200), flat_series(90, 75_000.0)), SyncConfig::default());
    let recorder = Recorder::default();

    let _sub = cache.observe(RangeToken::LastQuarter, recorder.listener());

    assert_eq!(recorder.len(), 1);
    let first = recorder.last();
    assert_eq!(first.series.len(), 90);
    assert!(!first.is_loading);
    assert!(first.is_placeholder);
    assert!(first.series.iter().all(|s| s.value() >= 40_000.0));
    assert_eq!(first.series.latest().unwrap().timestamp, start());
}

#[test]
fn fetched_series_replaces_placeholder() {
    let rt = runtime();
    let real = flat_series(7, 75_000.0);
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(200), real.clone()), SyncConfig::default());
    let recorder = Recorder::default();
    let _sub = cache.observe(RangeToken::LastWeek, recorder.listener());

    rt.advance(ms(199));
    assert_eq!(recorder.len(), 1);
    rt.advance(ms(1));
    assert_eq!(recorder.len(), 2);
    let state = recorder.last();
    assert_eq!(state.series, real);
    assert!(!state.is_placeholder);
    assert_eq!(cache.entry_status(RangeToken::LastWeek).unwrap().fetched_at, Some(start() + chrono::Duration::milliseconds(200)));
}

#[test]
fn polls_once_per_interval_while_observed() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 1.0)), SyncConfig::default());
    let _sub = cache.observe(RangeToken::LastWeek, |_| {});

    rt.run_until_stalled();
    assert_eq!(cache.source().calls(), 1);
    for second in 1..=5 {
        rt.advance(ms(999));
        assert_eq!(cache.source().calls(), second);
        rt.advance(ms(1));
        assert_eq!(cache.source().calls(), second + 1);
    }
}

#[test]
fn observers_within_stale_window_share_one_fetch() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 1.0)), SyncConfig::default());
    let first = Recorder::default();
    let second = Recorder::default();
    let third = Recorder::default();

    // Second observer arrives while the first fetch is in flight.
    let _a = cache.observe(RangeToken::LastWeek, first.listener());
    let _b = cache.observe(RangeToken::LastWeek, second.listener());
    rt.run_until_stalled();
    assert_eq!(cache.source().calls(), 1);

    rt.advance(ms(300));
    let _c = cache.observe(RangeToken::LastWeek, third.listener());
    rt.run_until_stalled();
    assert_eq!(cache.source().calls(), 1);
    assert!(!third.last().is_placeholder);
    assert_eq!(third.last().series, first.last().series);
    assert_eq!(second.len(), first.len());

    let status = cache.entry_status(RangeToken::LastWeek).unwrap();
    assert_eq!(status.observers, 3);
    assert!(!status.is_stale);
}

#[test]
fn observer_after_stale_window_triggers_fetch() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 1.0)), SyncConfig::default());
    let _a = cache.observe(RangeToken::LastWeek, |_| {});
    rt.advance(ms(600));
    assert!(cache.entry_status(RangeToken::LastWeek).unwrap().is_stale);

    let _b = cache.observe(RangeToken::LastWeek, |_| {});
    rt.run_until_stalled();
    assert_eq!(cache.source().calls(), 2);
}

#[test]
fn equal_results_do_not_renotify() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 64_000.0)), SyncConfig::default());
    let recorder = Recorder::default();
    let _sub = cache.observe(RangeToken::LastWeek, recorder.listener());

    rt.advance(ms(5_000));
    assert_eq!(cache.source().calls(), 6);
    assert_eq!(recorder.len(), 2);

    let delivered = recorder.last().series;
    let cached = cache.snapshot(RangeToken::LastWeek).unwrap().series;
    assert!(delivered.shares_buffer(&cached));
}

#[test]
fn changed_results_notify_every_observer() {
    let rt = runtime();
    let source = ScriptedSource::new(rt.clone(), |_, call| (ms(50), Ok(flat_series(7, 1_000.0 * (call + 1) as f64))));
    let cache = cache_with(&rt, source, SyncConfig::default());
    let a = Recorder::default();
    let b = Recorder::default();
    let _a = cache.observe(RangeToken::LastWeek, a.listener());
    let _b = cache.observe(RangeToken::LastWeek, b.listener());

    rt.advance(ms(2_100));
    assert_eq!(a.len(), 4);
    assert_eq!(a.all(), b.all());
    assert_eq!(a.last().series, flat_series(7, 3_000.0));
}

#[test]
fn failing_source_keeps_placeholder_visible() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::failing(rt.clone(), ms(100)), SyncConfig::default());
    let recorder = Recorder::default();
    let _sub = cache.observe(RangeToken::LastWeek, recorder.listener());

    rt.advance(ms(3_500));
    assert_eq!(cache.source().calls(), 4);
    assert_eq!(recorder.len(), 1);
    let state = recorder.last();
    assert_eq!(state.series.len(), 7);
    assert!(!state.is_loading);
    assert!(state.is_placeholder);
}

#[test]
fn failure_after_success_keeps_last_good_series() {
    let rt = runtime();
    let good = flat_series(7, 55_000.0);
    let kept = good.clone();
    let source = ScriptedSource::new(rt.clone(), move |_, call| {
        if call == 0 {
            (ms(100), Ok(kept.clone()))
        } else {
            (ms(100), Err(TransportError::Status { status: 503, text: "Service Unavailable".into() }))
        }
    });
    let cache = cache_with(&rt, source, SyncConfig::default());
    let recorder = Recorder::default();
    let _sub = cache.observe(RangeToken::LastWeek, recorder.listener());

    rt.advance(ms(4_000));
    assert_eq!(recorder.len(), 2);
    assert_eq!(recorder.last().series, good);
    assert!(!recorder.last().is_placeholder);
}

#[test]
fn without_placeholder_observers_see_loading_then_fallback() {
    let rt = runtime();
    let config = SyncConfig::default().with_placeholder(false);
    let cache = cache_with(&rt, ScriptedSource::failing(rt.clone(), ms(100)), config);
    let recorder = Recorder::default();
    let _sub = cache.observe(RangeToken::LastWeek, recorder.listener());

    let first = recorder.last();
    assert!(first.is_loading);
    assert!(first.series.is_empty());

    rt.advance(ms(100));
    assert_eq!(recorder.len(), 2);
    let fallback = recorder.last();
    assert!(!fallback.is_loading);
    assert!(fallback.is_placeholder);
    assert_eq!(fallback.series.len(), 7);
}

#[test]
fn late_response_never_overwrites_newer_one() {
    let rt = runtime();
    let stale = flat_series(7, 10_000.0);
    let fresh = flat_series(7, 20_000.0);
    let (slow, fast) = (stale.clone(), fresh.clone());
    let source = ScriptedSource::new(rt.clone(), move |_, call| {
        if call == 0 { (ms(800), Ok(slow.clone())) } else { (ms(100), Ok(fast.clone())) }
    });
    let config = SyncConfig::default().with_poll_interval(ms(300));
    let cache = cache_with(&rt, source, config);
    let recorder = Recorder::default();
    let _sub = cache.observe(RangeToken::LastWeek, recorder.listener());

    rt.advance(ms(400));
    assert_eq!(recorder.last().series, fresh);
    rt.advance(ms(500));
    assert_eq!(cache.snapshot(RangeToken::LastWeek).unwrap().series, fresh);
    assert!(recorder.all().iter().all(|state| state.series != stale));
}

#[test]
fn window_focus_is_ignored_by_default() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 1.0)), SyncConfig::default());
    let _sub = cache.observe(RangeToken::LastWeek, |_| {});
    rt.advance(ms(700));

    cache.on_window_focus(RangeToken::LastWeek);
    rt.run_until_stalled();
    assert_eq!(cache.source().calls(), 1);
}

#[test]
fn window_focus_refetches_stale_entry_when_enabled() {
    let rt = runtime();
    let config = SyncConfig::default().with_refetch_on_window_focus(true);
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 1.0)), config);
    let _sub = cache.observe(RangeToken::LastWeek, |_| {});

    rt.advance(ms(300));
    cache.on_window_focus(RangeToken::LastWeek);
    rt.run_until_stalled();
    assert_eq!(cache.source().calls(), 1);

    rt.advance(ms(400));
    cache.on_window_focus(RangeToken::LastWeek);
    rt.run_until_stalled();
    assert_eq!(cache.source().calls(), 2);
}

#[test]
fn dropping_last_subscription_stops_polling() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 1.0)), SyncConfig::default());
    let recorder = Recorder::default();
    let sub = cache.observe(RangeToken::LastWeek, recorder.listener());
    rt.advance(ms(150));

    sub.unsubscribe();
    rt.advance(ms(5_000));
    assert_eq!(cache.source().calls(), 1);
    assert_eq!(recorder.len(), 2);
    assert_eq!(rt.pending_timers(), 0);

    let status = cache.entry_status(RangeToken::LastWeek).unwrap();
    assert!(!status.polling);
    assert_eq!(status.observers, 0);
    assert_eq!(status.series, Some(flat_series(7, 1.0)));
}

#[test]
fn unsubscribe_aborts_in_flight_fetch() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(400), flat_series(7, 1.0)), SyncConfig::default());
    let recorder = Recorder::default();
    let sub = cache.observe(RangeToken::LastWeek, recorder.listener());
    rt.advance(ms(100));
    drop(sub);

    rt.advance(ms(1_000));
    assert_eq!(recorder.len(), 1);
    let status = cache.entry_status(RangeToken::LastWeek).unwrap();
    assert_eq!(status.in_flight, 0);
    assert_eq!(status.fetched_at, None);
}

#[test]
fn remaining_observer_keeps_polling() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(7, 1.0)), SyncConfig::default());
    let a = cache.observe(RangeToken::LastWeek, |_| {});
    let _b = cache.observe(RangeToken::LastWeek, |_| {});
    drop(a);

    rt.advance(ms(2_000));
    assert_eq!(cache.source().calls(), 3);
    assert!(cache.entry_status(RangeToken::LastWeek).unwrap().polling);
}

#[test]
fn ranges_are_cached_independently() {
    let rt = runtime();
    let source = ScriptedSource::new(rt.clone(), |token, _| (ms(100), Ok(flat_series(token.resolve().count, 1.0))));
    let cache = cache_with(&rt, source, SyncConfig::default());
    let week = Recorder::default();
    let day = Recorder::default();
    let _w = cache.observe(RangeToken::LastWeek, week.listener());
    let _d = cache.observe(RangeToken::LastDay, day.listener());

    rt.advance(ms(1_500));
    assert_eq!(cache.source().calls_for(RangeToken::LastWeek), 2);
    assert_eq!(cache.source().calls_for(RangeToken::LastDay), 2);
    assert_eq!(week.last().series.len(), 7);
    assert_eq!(day.last().series.len(), 24);
}

#[test]
fn quarter_aliases_share_one_entry() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(100), flat_series(90, 1.0)), SyncConfig::default());
    let _a = cache.observe(RangeToken::parse_lenient("3m"), |_| {});
    let _b = cache.observe(RangeToken::parse_lenient("90d"), |_| {});
    rt.run_until_stalled();

    assert_eq!(cache.source().calls(), 1);
    assert_eq!(cache.entry_status(RangeToken::LastQuarter).unwrap().observers, 2);
}

#[test]
fn hanging_fetches_are_capped() {
    let rt = runtime();
    let cache = cache_with(&rt, ScriptedSource::constant(rt.clone(), ms(3_600_000), flat_series(7, 1.0)), SyncConfig::default());
    let recorder = Recorder::default();
    let _sub = cache.observe(RangeToken::LastWeek, recorder.listener());

    rt.advance(ms(60_000));
    assert_eq!(cache.source().calls(), MAX_IN_FLIGHT);
    assert_eq!(cache.entry_status(RangeToken::LastWeek).unwrap().in_flight, MAX_IN_FLIGHT);
    // Capped fetches plus the poller.
    assert_eq!(rt.pending_timers(), MAX_IN_FLIGHT + 1);
    assert_eq!(recorder.len(), 1);
}

#[test]
fn applied_result_aborts_older_fetches() {
    let rt = runtime();
    let source = ScriptedSource::new(rt.clone(), |_, call| {
        let latency = if call == 0 { ms(3_600_000) } else { ms(100) };
        (latency, Ok(flat_series(7, 2_000.0)))
    });
    let cache = cache_with(&rt, source, SyncConfig::default());
    let _sub = cache.observe(RangeToken::LastWeek, |_| {});

    rt.advance(ms(1_100));
    assert_eq!(cache.source().calls(), 2);
    assert_eq!(cache.entry_status(RangeToken::LastWeek).unwrap().in_flight, 0);
    assert_eq!(rt.pending_timers(), 1);
}
