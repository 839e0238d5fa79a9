//! Logs what each reducer step changed, as a JSON encoded
//! [serde_diff] diff between the previous and next state.

use super::{simple_logger::LogLevel, Middleware, MiddlewareContext};
use crate::{DispatchFn, Dispatched};
use serde_diff::{Diff, SerdeDiff};
use std::{fmt::Debug, sync::Arc};

/// The JSON encoded diff between `prev` and `next`, or `None` if they
/// are the same state.
pub fn diff<State: SerdeDiff>(
    prev: &Arc<State>,
    next: &Arc<State>,
) -> Option<Result<String, serde_json::Error>> {
    if Arc::ptr_eq(prev, next) {
        return None;
    }

    Some(serde_json::to_string(&Diff::serializable(&**prev, &**next)))
}

/// Logs the action, then the diff its reducer step made to the state.
/// Nothing is logged for dispatches which did not reach the reducer.
#[derive(Debug, Default)]
pub struct DiffLoggerMiddleware {
    log_level: LogLevel,
}

impl DiffLoggerMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

impl<State, Action> Middleware<State, Action> for DiffLoggerMiddleware
where
    State: SerdeDiff,
    Action: Debug,
{
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<State, Action>,
        action: Action,
        next: &DispatchFn<Action>,
    ) -> Dispatched<Action> {
        let prev_state = context.state();
        let result = next(action);

        if let Dispatched::Reduced(action) = &result {
            match diff(&prev_state, &context.state()) {
                Some(Ok(diff)) => self.log_level.log(format!("{:?}: {}", action, diff)),
                Some(Err(error)) => log::warn!("unable to serialize state diff: {}", error),
                None => self.log_level.log(format!("{:?}: unchanged", action)),
            }
        }

        result
    }
}
