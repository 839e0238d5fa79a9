//! Logging through the [log] crate: ready-made log functions for
//! [LogMiddleware](super::logger::LogMiddleware) and
//! [LazyLogMiddleware](super::logger::LazyLogMiddleware), and a
//! [SimpleLoggerMiddleware] which logs the state either side of each
//! action.

use super::{Middleware, MiddlewareContext};
use crate::{DispatchFn, Dispatched};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Warn,
    Info,
}

impl LogLevel {
    pub fn log<S: AsRef<str>>(&self, message: S) {
        match self {
            LogLevel::Trace => log::trace!("{}", message.as_ref()),
            LogLevel::Debug => log::debug!("{}", message.as_ref()),
            LogLevel::Warn => log::warn!("{}", message.as_ref()),
            LogLevel::Info => log::info!("{}", message.as_ref()),
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

/// A log function printing `[tag][Action] action`.
pub fn action_logger<State, Action>(
    log_level: LogLevel,
) -> impl Fn(&str, &Action, &MiddlewareContext<State, Action>) + Send + Sync + 'static
where
    State: 'static,
    Action: Debug + 'static,
{
    move |tag: &str, action: &Action, _: &MiddlewareContext<State, Action>| {
        log_level.log(format!("[{}][Action] {:?}", tag, action))
    }
}

/// A log function printing `[tag][State] state`.
pub fn state_logger<State, Action>(
    log_level: LogLevel,
) -> impl Fn(&str, &Action, &MiddlewareContext<State, Action>) + Send + Sync + 'static
where
    State: Debug + 'static,
    Action: 'static,
{
    move |tag: &str, _: &Action, context: &MiddlewareContext<State, Action>| {
        log_level.log(format!("[{}][State] {:?}", tag, context.state()))
    }
}

/// Logs the previous state, the action, and the next state of every
/// dispatch passing through it.
#[derive(Debug, Default)]
pub struct SimpleLoggerMiddleware {
    log_level: LogLevel,
}

impl SimpleLoggerMiddleware {
    pub fn new() -> Self {
        SimpleLoggerMiddleware {
            log_level: LogLevel::default(),
        }
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

impl<State, Action> Middleware<State, Action> for SimpleLoggerMiddleware
where
    State: Debug,
    Action: Debug,
{
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<State, Action>,
        action: Action,
        next: &DispatchFn<Action>,
    ) -> Dispatched<Action> {
        self.log_level
            .log(format!("prev state: {:?}", context.state()));
        self.log_level.log(format!("action: {:?}", action));

        let result = next(action);

        match &result {
            Dispatched::Reduced(_) => self
                .log_level
                .log(format!("next state: {:?}", context.state())),
            Dispatched::Started(_) => self.log_level.log("async action started"),
            Dispatched::Stopped => self.log_level.log("action stopped"),
            Dispatched::Redirected(_) => self.log_level.log("action redirected"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::{action_logger, state_logger, LogLevel, SimpleLoggerMiddleware};
    use crate::{
        middleware::logger::{LazyLogMiddleware, LogMiddleware},
        Action, Store,
    };
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Rename(&'static str);

    impl Action for Rename {}

    #[test]
    fn simple_loggers_pass_actions_through() {
        let store = Store::builder(
            |_: &Arc<String>, action: &Rename| Arc::new(action.0.to_string()),
            String::from("before"),
        )
        .middleware(SimpleLoggerMiddleware::new().log_level(LogLevel::Info))
        .middleware(LogMiddleware::new("ACTION", action_logger(LogLevel::Trace)))
        .middleware(LazyLogMiddleware::new("RESULT", state_logger(LogLevel::Warn)))
        .build();

        assert!(store.dispatch(Rename("after")).is_reduced());
        assert_eq!(*store.state(), "after");
    }

    #[test]
    fn default_log_level_is_debug() {
        assert_eq!(LogLevel::default(), LogLevel::Debug);
    }
}
