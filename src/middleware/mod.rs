//! [Middleware] used to modify the behaviour of a [Store] during a
//! [Store::dispatch()]. This module also contains the built-in
//! middleware: loggers, the main thread redirector and the adapters
//! which run the side effects of async and doable actions.
//!
//! Middleware is composed like an onion. The first middleware in the
//! list given to the store is the outermost: it sees the action first
//! on the way in, and the [Dispatched] outcome last on the way out.
//!
//! [Store]: crate::Store
//! [Store::dispatch()]: crate::Store::dispatch()

pub mod async_action;
#[cfg(feature = "diff_logger")]
pub mod diff_logger;
pub mod doable;
pub mod logger;
pub mod main_queue;
pub mod simple_logger;

use crate::{store::StateCell, DispatchFn, Dispatched, Dispatcher};
use std::{fmt::Debug, sync::Arc};

/// Read access to the store's state and a handle onto its public
/// dispatch entry point, given to every [Middleware] invocation.
pub struct MiddlewareContext<State, Action> {
    state: StateCell<State>,
    dispatcher: Dispatcher<Action>,
}

impl<State, Action> Clone for MiddlewareContext<State, Action> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<State, Action> Debug for MiddlewareContext<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareContext")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<State, Action> MiddlewareContext<State, Action> {
    pub(crate) fn new(state: StateCell<State>, dispatcher: Dispatcher<Action>) -> Self {
        Self { state, dispatcher }
    }

    /// The current state of the store, as of the last completed
    /// reducer step.
    pub fn state(&self) -> Arc<State> {
        self.state.get()
    }

    /// Dispatches through the whole chain again, starting from the
    /// outermost middleware.
    pub fn dispatcher(&self) -> &Dispatcher<Action> {
        &self.dispatcher
    }
}

/// `Middleware` used to modify the behaviour of a [Store](crate::Store)
/// during a [Store::dispatch()](crate::Store::dispatch()).
///
/// Any closure with the signature of [Middleware::on_dispatch()] is
/// middleware too; see [middleware_fn()].
pub trait Middleware<State, Action>: Send + Sync {
    /// Invoked for every action which reaches this middleware. Calling
    /// `next` passes the action (or a replacement for it) on to the
    /// rest of the chain, and finally to the reducer.
    ///
    /// Not calling `next` is allowed and halts the chain for this
    /// action; nothing is reduced. Actions dispatched through
    /// [MiddlewareContext::dispatcher()] start over from the outermost
    /// middleware.
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<State, Action>,
        action: Action,
        next: &DispatchFn<Action>,
    ) -> Dispatched<Action>;
}

impl<State, Action, F> Middleware<State, Action> for F
where
    F: Fn(&MiddlewareContext<State, Action>, Action, &DispatchFn<Action>) -> Dispatched<Action>
        + Send
        + Sync,
{
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<State, Action>,
        action: Action,
        next: &DispatchFn<Action>,
    ) -> Dispatched<Action> {
        (self)(context, action, next)
    }
}

/// Helper to create [Middleware] from a closure, pinning down the
/// closure's argument types.
///
/// ```
/// use reactive_dispatch::{
///     middleware::{middleware_fn, MiddlewareContext},
///     DispatchFn, Dispatched, StoreRef,
/// };
/// use std::sync::Arc;
///
/// let ignore_empty = middleware_fn(
///     |_context: &MiddlewareContext<usize, String>, action: String, next: &DispatchFn<String>| {
///         if action.is_empty() {
///             Dispatched::Stopped
///         } else {
///             next(action)
///         }
///     },
/// );
///
/// let store = StoreRef::new(
///     |count: &Arc<usize>, _action: &String| Arc::new(**count + 1),
///     0,
///     vec![Box::new(ignore_empty)],
/// );
/// store.dispatch(String::new());
/// store.dispatch("hello".to_string());
/// assert_eq!(*store.state(), 1);
/// ```
pub fn middleware_fn<State, Action, F>(process: F) -> F
where
    F: Fn(&MiddlewareContext<State, Action>, Action, &DispatchFn<Action>) -> Dispatched<Action>
        + Send
        + Sync,
{
    process
}

/// Calls a function with the store context and the action before
/// passing the action on unchanged.
pub struct FunctionMiddleware<State, Action> {
    function: Box<dyn Fn(&MiddlewareContext<State, Action>, &Action) + Send + Sync>,
}

impl<State, Action> FunctionMiddleware<State, Action> {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&MiddlewareContext<State, Action>, &Action) + Send + Sync + 'static,
    {
        Self {
            function: Box::new(function),
        }
    }
}

impl<State, Action> Debug for FunctionMiddleware<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FunctionMiddleware")
    }
}

impl<State, Action> Middleware<State, Action> for FunctionMiddleware<State, Action> {
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<State, Action>,
        action: Action,
        next: &DispatchFn<Action>,
    ) -> Dispatched<Action> {
        (self.function)(context, &action);
        next(action)
    }
}

/// Fold `middleware` right to left around the `terminal` reducer
/// step, so that the first middleware ends up outermost.
pub(crate) fn compose<State, Action>(
    context: MiddlewareContext<State, Action>,
    middleware: Vec<Box<dyn Middleware<State, Action>>>,
    terminal: DispatchFn<Action>,
) -> DispatchFn<Action>
where
    State: Send + Sync + 'static,
    Action: Send + 'static,
{
    middleware
        .into_iter()
        .rev()
        .fold(terminal, |next, middleware| {
            let context = context.clone();
            Arc::new(move |action| middleware.on_dispatch(&context, action, &next))
        })
}

#[cfg(test)]
mod tests {
    use super::{FunctionMiddleware, MiddlewareContext};
    use crate::{Action, Store};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Add(u32);

    impl Action for Add {}

    fn reducer(state: &Arc<u32>, action: &Add) -> Arc<u32> {
        Arc::new(**state + action.0)
    }

    #[test]
    fn function_middleware_sees_state_before_reducing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_copy = seen.clone();
        let store = Store::builder(reducer, 0)
            .middleware(FunctionMiddleware::new(
                move |context: &MiddlewareContext<u32, Add>, action: &Add| {
                    seen_copy.lock().unwrap().push((*context.state(), *action));
                },
            ))
            .build();

        store.dispatch(Add(2));
        store.dispatch(Add(3));

        assert_eq!(*seen.lock().unwrap(), vec![(0, Add(2)), (2, Add(3))]);
        assert_eq!(*store.state(), 5);
    }

    #[test]
    fn context_dispatcher_reaches_the_same_store() {
        let store = Store::builder(reducer, 0)
            .middleware(FunctionMiddleware::new(
                |context: &MiddlewareContext<u32, Add>, _: &Add| {
                    assert!(context.dispatcher().is_alive());
                },
            ))
            .build();

        assert!(store.dispatcher().dispatch(Add(4)).is_reduced());
        assert_eq!(*store.state(), 4);
    }
}
