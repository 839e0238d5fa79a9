use crate::{
    dispatch::DispatchEntry,
    listener::Subscriptions,
    middleware::{compose, Middleware, MiddlewareContext},
    AsListener, DispatchFn, Dispatched, Dispatcher, Listener, Reducer, ReentrantDispatch,
    SubscriptionId,
};
use std::{
    fmt::Debug,
    ops::Deref,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak},
    thread::{self, ThreadId},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared cell holding the current state of a store. Readers get a
/// snapshot; the reducer step swaps in a whole new value.
pub(crate) struct StateCell<State>(Arc<RwLock<Arc<State>>>);

impl<State> Clone for StateCell<State> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<State> StateCell<State> {
    fn new(state: State) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(state))))
    }

    pub fn get(&self) -> Arc<State> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace(&self, state: Arc<State>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Idle,
    Dispatching(ThreadId),
}

/// Serializes the reducer step. Entering again from the thread which
/// is already inside is a fatal error; other threads wait their turn.
struct DispatchGuard {
    state: Mutex<DispatchState>,
    section: Mutex<()>,
}

impl DispatchGuard {
    fn new() -> Self {
        Self {
            state: Mutex::new(DispatchState::Idle),
            section: Mutex::new(()),
        }
    }

    fn enter(&self) -> ReducerPass<'_> {
        let current = thread::current().id();
        if *lock(&self.state) == DispatchState::Dispatching(current) {
            std::panic::panic_any(ReentrantDispatch { thread: current });
        }

        let section = lock(&self.section);
        *lock(&self.state) = DispatchState::Dispatching(current);

        ReducerPass {
            guard: self,
            _section: section,
        }
    }

    fn is_dispatching(&self) -> bool {
        *lock(&self.state) != DispatchState::Idle
    }
}

/// Holds the store in the dispatching state until dropped, on every
/// exit path including unwinding.
struct ReducerPass<'a> {
    guard: &'a DispatchGuard,
    _section: MutexGuard<'a, ()>,
}

impl Drop for ReducerPass<'_> {
    fn drop(&mut self) {
        *lock(&self.guard.state) = DispatchState::Idle;
    }
}

/// A wrapper for an [Arc] reference to a [Store].
///
/// This is how a store is created and shared: the store's
/// [Dispatcher] handles, and the context given to its middleware,
/// refer back to it weakly, so it must live behind an [Arc].
pub struct StoreRef<State, Action>(Arc<Store<State, Action>>);

impl<State, Action> StoreRef<State, Action>
where
    State: Send + Sync + 'static,
    Action: Send + 'static,
{
    /// Create a new store which uses `reducer` to produce new states
    /// from `initial_state`, with `middleware` around its reducer step.
    pub fn new<R: Reducer<State, Action> + 'static>(
        reducer: R,
        initial_state: State,
        middleware: Vec<Box<dyn Middleware<State, Action>>>,
    ) -> Self {
        Self::from_parts(Box::new(reducer), initial_state, middleware)
    }

    fn from_parts(
        reducer: Box<dyn Reducer<State, Action>>,
        initial_state: State,
        middleware: Vec<Box<dyn Middleware<State, Action>>>,
    ) -> Self {
        let state = StateCell::new(initial_state);

        Self(Arc::new_cyclic(|store: &Weak<Store<State, Action>>| {
            let entry: Weak<dyn DispatchEntry<Action>> = store.clone();
            let dispatcher = Dispatcher::new(entry);

            let store = store.clone();
            let reduce: DispatchFn<Action> = Arc::new(move |action| match store.upgrade() {
                Some(store) => store.reduce(action),
                None => Dispatched::Stopped,
            });

            let context = MiddlewareContext::new(state.clone(), dispatcher.clone());
            let dispatch = compose(context, middleware, reduce);

            Store {
                state,
                reducer,
                subscriptions: Mutex::new(Subscriptions::new()),
                guard: DispatchGuard::new(),
                dispatch,
                dispatcher,
            }
        }))
    }
}

impl<State, Action> Clone for StoreRef<State, Action> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<State, Action> Deref for StoreRef<State, Action> {
    type Target = Store<State, Action>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<State, Action> PartialEq for StoreRef<State, Action> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<State, Action> Debug for StoreRef<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything a [Store] is configured with: the initial state, the
/// reducer and the ordered middleware.
pub struct StoreBuilder<State, Action> {
    reducer: Box<dyn Reducer<State, Action>>,
    initial_state: State,
    middleware: Vec<Box<dyn Middleware<State, Action>>>,
}

impl<State, Action> StoreBuilder<State, Action>
where
    State: Send + Sync + 'static,
    Action: Send + 'static,
{
    /// Append `middleware` to the chain. Middleware added first is
    /// outermost.
    pub fn middleware<M: Middleware<State, Action> + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn build(self) -> StoreRef<State, Action> {
        StoreRef::from_parts(self.reducer, self.initial_state, self.middleware)
    }
}

/// This struct is designed to operate as a central source of truth
/// and global "immutable" state within your application.
///
/// The current state of this store ([Store::state()]) can only be
/// modified by dispatching an `Action` via [Store::dispatch()] to the
/// store. The action passes through the store's middleware, and if
/// it makes it all the way through, the [Reducer] which you provided
/// at construction produces a new current state from it. The previous
/// state is never mutated, and remains as a reference for any element
/// of your application which may rely upon it.
///
/// The reducer step is single writer: subscribers are notified
/// synchronously inside it, and dispatching again from inside it on
/// the same thread (from a reducer or a subscriber) panics with
/// [ReentrantDispatch]. Schedule follow-up actions instead, for example
/// from middleware after `next` returns, or from an async task.
///
/// Listeners can subscribe to changes to the `State` in this store
/// (and the `Action` which caused them) with [Store::subscribe()] or
/// [Store::subscribe_fn()].
pub struct Store<State, Action> {
    /// The current state of this store.
    state: StateCell<State>,
    /// The [Reducer] for this store, which takes `Actions` and
    /// produces the next `State`.
    reducer: Box<dyn Reducer<State, Action>>,
    /// The listeners which are notified of changes to the state of
    /// this store during a [Store::dispatch()].
    subscriptions: Mutex<Subscriptions<State, Action>>,
    /// Prevents dispatch recursion into the reducer step.
    guard: DispatchGuard,
    /// The middleware chain, ending in [Store::reduce()].
    dispatch: DispatchFn<Action>,
    dispatcher: Dispatcher<Action>,
}

impl<State, Action> Store<State, Action>
where
    State: Send + Sync + 'static,
    Action: Send + 'static,
{
    /// Start configuring a new store with the `reducer` and the
    /// `initial_state`.
    pub fn builder<R: Reducer<State, Action> + 'static>(
        reducer: R,
        initial_state: State,
    ) -> StoreBuilder<State, Action> {
        StoreBuilder {
            reducer: Box::new(reducer),
            initial_state,
            middleware: Vec::new(),
        }
    }

    /// Get the current `State` stored in this store.
    ///
    /// Modifications to this state need to be performed by
    /// dispatching an `Action` to the store using
    /// [dispatch()](Store::dispatch()).
    pub fn state(&self) -> Arc<State> {
        self.state.get()
    }

    /// Dispatch an `Action` through the middleware chain to be passed
    /// to the [Reducer] in order to modify the `State` in this store.
    ///
    /// Returns what came back out of the chain: see [Dispatched].
    pub fn dispatch(&self, action: Action) -> Dispatched<Action> {
        (self.dispatch)(action)
    }

    /// Dispatch each of `actions` in order, each as an independent
    /// full pass through the middleware chain. An action does not
    /// start until the previous one's pass, subscriber notification
    /// included, has completed.
    pub fn dispatch_batch<I>(&self, actions: I) -> Vec<Dispatched<Action>>
    where
        I: IntoIterator<Item = Action>,
    {
        actions
            .into_iter()
            .map(|action| self.dispatch(action))
            .collect()
    }

    /// A handle onto [Store::dispatch()] which can be kept and moved
    /// to other threads without keeping the store alive.
    pub fn dispatcher(&self) -> Dispatcher<Action> {
        self.dispatcher.clone()
    }

    /// Subscribe a [Listener] to changes in the store state.
    ///
    /// The listener is a weak reference; when the strong reference
    /// associated with it (usually a [Callback](crate::Callback)) is
    /// dropped, the listener is removed from this store on the next
    /// notification.
    pub fn subscribe<L: AsListener<State, Action>>(&self, listener: L) -> SubscriptionId {
        lock(&self.subscriptions).insert(listener.as_listener())
    }

    /// Subscribe a closure to changes in the store state. The store
    /// keeps the closure until [Store::unsubscribe()] is called with
    /// the returned id.
    pub fn subscribe_fn<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(Arc<State>, &Action) + Send + Sync + 'static,
    {
        lock(&self.subscriptions).insert(Listener::Strong(Arc::new(subscriber)))
    }

    /// Remove a subscription. Returns `false` if it was unknown or
    /// already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.subscriptions).remove(id)
    }

    /// The number of subscribers which are still alive.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscriptions).live_callbacks().len()
    }

    /// Whether a reducer step is in flight on any thread.
    pub fn is_dispatching(&self) -> bool {
        self.guard.is_dispatching()
    }

    /// The terminal step of the middleware chain: reduce, replace the
    /// state, and notify subscribers.
    fn reduce(&self, action: Action) -> Dispatched<Action> {
        let _pass = self.guard.enter();
        log::trace!("reducer step entered");

        let prev_state = self.state.get();
        let state = self.reducer.reduce(&prev_state, &action);
        self.state.replace(state.clone());
        self.notify(state, &action);

        log::trace!("reducer step completed");
        Dispatched::Reduced(action)
    }

    /// Notify live subscribers, in subscription order. The registry is
    /// not locked while they run, so they may subscribe and
    /// unsubscribe; changes apply from the next notification.
    fn notify(&self, state: Arc<State>, action: &Action) {
        let callbacks = lock(&self.subscriptions).live_callbacks();
        for callback in callbacks {
            callback.emit(state.clone(), action);
        }
    }
}

impl<State, Action> DispatchEntry<Action> for Store<State, Action>
where
    State: Send + Sync + 'static,
    Action: Send + 'static,
{
    fn dispatch_entry(&self, action: Action) -> Dispatched<Action> {
        self.dispatch(action)
    }
}

impl<State, Action> Debug for Store<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("dispatching", &self.guard.is_dispatching())
            .finish_non_exhaustive()
    }
}
