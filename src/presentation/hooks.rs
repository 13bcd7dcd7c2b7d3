//! Leptos bindings for the sync cache.

use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::application::{ChartState, Subscription, SyncCache};
use crate::domain::metrics::{MetricsSource, RangeToken};

/// Reactive chart state for the range currently held by `range`.
///
/// Changing `range` releases the previous subscription before observing the
/// new token. Window focus is forwarded to the cache, which ignores it unless
/// `refetch_on_window_focus` is set.
pub fn use_chart_data<S: MetricsSource + 'static>(
    cache: SyncCache<S>,
    range: Signal<RangeToken>,
) -> ReadSignal<ChartState> {
    let state = create_rw_signal(ChartState::loading());
    let current: Rc<RefCell<Option<Subscription>>> = Rc::default();

    {
        let current = Rc::clone(&current);
        let cache = cache.clone();
        create_effect(move |_| {
            let token = range.get();
            if current.borrow().as_ref().map(Subscription::token) == Some(token) {
                return;
            }
            current.borrow_mut().take();
            let next = cache.observe(token, move |update| state.set(update.clone()));
            *current.borrow_mut() = Some(next);
        });
    }

    let focus = {
        let current = Rc::clone(&current);
        window_event_listener(ev::focus, move |_| {
            let token = current.borrow().as_ref().map(Subscription::token);
            if let Some(token) = token {
                cache.on_window_focus(token);
            }
        })
    };

    on_cleanup(move || {
        focus.remove();
        current.borrow_mut().take();
    });

    state.read_only()
}
