//! Keeps the rest of the middleware chain, and so every reducer step
//! and subscriber notification, on the thread owning a
//! [MainQueue](crate::MainQueue).

use super::{Middleware, MiddlewareContext};
use crate::{async_task::CancelFlag, Action, DispatchFn, Dispatched, MainHandle, Pending};

/// Passes actions dispatched on the main thread straight on. Actions
/// dispatched from any other thread are posted to the main queue, to
/// continue down the chain when it is next pumped, and the dispatch
/// returns [Dispatched::Redirected] immediately.
///
/// Place it first so that everything after it runs on the main thread.
///
/// A redirected result of an async action is dropped, and resolves to
/// [Dispatched::Stopped], if the action is cancelled before the main
/// queue gets to it.
#[derive(Debug, Clone)]
pub struct MainQueueMiddleware {
    main: MainHandle,
}

impl MainQueueMiddleware {
    pub fn new(main: MainHandle) -> Self {
        Self { main }
    }
}

impl<S, A: Action> Middleware<S, A> for MainQueueMiddleware {
    fn on_dispatch(
        &self,
        _context: &MiddlewareContext<S, A>,
        action: A,
        next: &DispatchFn<A>,
    ) -> Dispatched<A> {
        if self.main.is_current() {
            return next(action);
        }

        let (sender, pending) = Pending::channel();
        let next = next.clone();
        let cancel_flag = CancelFlag::current();
        let posted = self.main.post(move || {
            let dispatched = match cancel_flag {
                Some(flag) if flag.is_raised() => {
                    log::debug!("dropping a redirected completion of a cancelled async action");
                    Dispatched::Stopped
                }
                _ => next(action),
            };
            // The dispatching side may have stopped caring.
            let _ = sender.send(dispatched);
        });

        match posted {
            Ok(()) => Dispatched::Redirected(pending),
            Err(error) => {
                log::warn!("unable to redirect action to the main thread: {}", error);
                Dispatched::Stopped
            }
        }
    }
}
