//! Middleware which hands each dispatched action to a log function,
//! either before the rest of the chain runs ([LogMiddleware]) or after
//! it has returned ([LazyLogMiddleware]).
//!
//! Log functions receive `(tag, action, context)`, where the context
//! gives access to the current state. They are expected not to panic;
//! if one does, the panic is swallowed and reported with
//! [log::warn!], and the dispatch carries on.

use super::{Middleware, MiddlewareContext};
use crate::{DispatchFn, Dispatched};
use std::{
    fmt::Debug,
    panic::{self, AssertUnwindSafe},
};

type LogFn<State, Action> =
    Box<dyn Fn(&str, &Action, &MiddlewareContext<State, Action>) + Send + Sync>;

fn log_swallowing_panics<State, Action>(
    tag: &str,
    log_fn: &LogFn<State, Action>,
    action: &Action,
    context: &MiddlewareContext<State, Action>,
) {
    if panic::catch_unwind(AssertUnwindSafe(|| log_fn(tag, action, context))).is_err() {
        log::warn!("log function tagged {:?} panicked, ignoring", tag);
    }
}

/// Runs the wrapped closure when dropped, so it fires exactly once
/// however the scope is left.
struct Deferred<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for Deferred<F> {
    fn drop(&mut self) {
        if let Some(deferred) = self.0.take() {
            deferred();
        }
    }
}

/// Logs the raw action before passing it on.
pub struct LogMiddleware<State, Action> {
    tag: String,
    log: LogFn<State, Action>,
}

impl<State, Action> LogMiddleware<State, Action> {
    pub fn new<T, F>(tag: T, log: F) -> Self
    where
        T: Into<String>,
        F: Fn(&str, &Action, &MiddlewareContext<State, Action>) + Send + Sync + 'static,
    {
        Self {
            tag: tag.into(),
            log: Box::new(log),
        }
    }
}

impl<State, Action> Debug for LogMiddleware<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogMiddleware")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

impl<State, Action> Middleware<State, Action> for LogMiddleware<State, Action> {
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<State, Action>,
        action: Action,
        next: &DispatchFn<Action>,
    ) -> Dispatched<Action> {
        log_swallowing_panics(&self.tag, &self.log, &action, context);
        next(action)
    }
}

/// Logs the action once the rest of the chain has returned, on every
/// exit path (including unwinding), so the log function observes the
/// state the action produced.
///
/// The action is cloned before being passed on, since the log call
/// happens after it has been handed over.
pub struct LazyLogMiddleware<State, Action> {
    tag: String,
    log: LogFn<State, Action>,
}

impl<State, Action> LazyLogMiddleware<State, Action> {
    pub fn new<T, F>(tag: T, log: F) -> Self
    where
        T: Into<String>,
        F: Fn(&str, &Action, &MiddlewareContext<State, Action>) + Send + Sync + 'static,
    {
        Self {
            tag: tag.into(),
            log: Box::new(log),
        }
    }
}

impl<State, Action> Debug for LazyLogMiddleware<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyLogMiddleware")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

impl<State, Action: Clone> Middleware<State, Action> for LazyLogMiddleware<State, Action> {
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<State, Action>,
        action: Action,
        next: &DispatchFn<Action>,
    ) -> Dispatched<Action> {
        let logged = action.clone();
        let _log = Deferred(Some(|| {
            log_swallowing_panics(&self.tag, &self.log, &logged, context)
        }));
        next(action)
    }
}

#[cfg(test)]
mod tests {
    use super::{LazyLogMiddleware, LogMiddleware};
    use crate::{
        middleware::{middleware_fn, MiddlewareContext},
        Action, DispatchFn, Dispatched, Store,
    };
    use std::{
        panic::{self, AssertUnwindSafe},
        sync::{Arc, Mutex},
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Counter {
        Add(i32),
        Explode,
    }

    impl Action for Counter {}

    fn reducer(state: &Arc<i32>, action: &Counter) -> Arc<i32> {
        match action {
            Counter::Add(n) => Arc::new(**state + n),
            Counter::Explode => state.clone(),
        }
    }

    type Lines = Arc<Mutex<Vec<String>>>;

    fn recording(
        lines: &Lines,
    ) -> impl Fn(&str, &Counter, &MiddlewareContext<i32, Counter>) + Send + Sync + 'static {
        let lines = lines.clone();
        move |tag: &str, action: &Counter, context: &MiddlewareContext<i32, Counter>| {
            lines
                .lock()
                .unwrap()
                .push(format!("[{}] {:?} state={}", tag, action, context.state()));
        }
    }

    #[test]
    fn eager_logger_logs_before_reducing() {
        let lines: Lines = Arc::default();
        let store = Store::builder(reducer, 0)
            .middleware(LogMiddleware::new("ACTION", recording(&lines)))
            .build();

        store.dispatch(Counter::Add(2));
        assert_eq!(*lines.lock().unwrap(), vec!["[ACTION] Add(2) state=0"]);
    }

    #[test]
    fn lazy_logger_logs_after_reducing() {
        let lines: Lines = Arc::default();
        let store = Store::builder(reducer, 0)
            .middleware(LazyLogMiddleware::new("RESULT", recording(&lines)))
            .build();
        let lines_copy = lines.clone();
        store.subscribe_fn(move |_, _| lines_copy.lock().unwrap().push("notified".to_string()));

        store.dispatch(Counter::Add(2));
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["notified", "[RESULT] Add(2) state=2"]
        );
    }

    #[test]
    fn lazy_logger_fires_once_when_the_chain_unwinds() {
        let lines: Lines = Arc::default();
        let store = Store::builder(reducer, 0)
            .middleware(LazyLogMiddleware::new("RESULT", recording(&lines)))
            .middleware(middleware_fn(
                |_: &MiddlewareContext<i32, Counter>, action: Counter, next: &DispatchFn<Counter>| {
                    if action == Counter::Explode {
                        panic!("boom");
                    }
                    next(action)
                },
            ))
            .build();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            store.dispatch(Counter::Explode);
        }));
        assert!(result.is_err());
        assert_eq!(*lines.lock().unwrap(), vec!["[RESULT] Explode state=0"]);
    }

    #[test]
    fn lazy_logger_fires_once_when_the_chain_stops() {
        let lines: Lines = Arc::default();
        let store = Store::builder(reducer, 0)
            .middleware(LazyLogMiddleware::new("RESULT", recording(&lines)))
            .middleware(middleware_fn(
                |_: &MiddlewareContext<i32, Counter>, _: Counter, _: &DispatchFn<Counter>| {
                    Dispatched::Stopped
                },
            ))
            .build();

        assert!(store.dispatch(Counter::Add(1)).is_stopped());
        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn panicking_log_function_is_swallowed() {
        let store = Store::builder(reducer, 0)
            .middleware(LogMiddleware::new(
                "BROKEN",
                |_: &str, _: &Counter, _: &MiddlewareContext<i32, Counter>| panic!("logger failed"),
            ))
            .middleware(LazyLogMiddleware::new(
                "BROKEN",
                |_: &str, _: &Counter, _: &MiddlewareContext<i32, Counter>| panic!("logger failed"),
            ))
            .build();

        assert!(store.dispatch(Counter::Add(5)).is_reduced());
        assert_eq!(*store.state(), 5);
    }
}
