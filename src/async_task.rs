use crate::{Action, Dispatched, Dispatcher};
use std::{
    cell::RefCell,
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

thread_local! {
    static DISPATCHING_COMPLETION: RefCell<Option<CancelFlag>> = RefCell::new(None);
}

/// Requests early termination of an in-flight asynchronous
/// operation, closing over whatever resource needs to be torn down.
///
/// A canceller can only be invoked once; [Canceller::cancel()]
/// consumes it. Dropping it without cancelling lets the operation run
/// to completion.
pub struct Canceller(Box<dyn FnOnce() + Send>);

impl Canceller {
    pub fn new<F: FnOnce() + Send + 'static>(cancel: F) -> Self {
        Self(Box::new(cancel))
    }

    pub fn cancel(self) {
        (self.0)()
    }
}

impl Debug for Canceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Canceller")
    }
}

/// An asynchronous operation attached to an [Action] (see
/// [Action::async_task()]).
///
/// When started, the task receives a [Completion] through which it
/// reports its result (success or failure, each wrapped in an action)
/// and returns straight away, optionally with a [Canceller].
pub struct AsyncTask<A>(Box<dyn FnOnce(Completion<A>) -> Option<Canceller> + Send>);

impl<A> AsyncTask<A> {
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(Completion<A>) -> Option<Canceller> + Send + 'static,
    {
        Self(Box::new(task))
    }

    pub fn start(self, completion: Completion<A>) -> Option<Canceller> {
        (self.0)(completion)
    }
}

impl<A> Debug for AsyncTask<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AsyncTask")
    }
}

/// The callback handed to a running [AsyncTask] for dispatching its
/// results back into the store.
///
/// Every dispatch through a `Completion` is a brand new top level
/// dispatch. Once the canceller produced for the task has been
/// invoked, the completion is closed: anything dispatched through it
/// afterwards is dropped and [Dispatched::Stopped] is returned.
pub struct Completion<A> {
    dispatcher: Dispatcher<A>,
    cancelled: Arc<AtomicBool>,
}

impl<A> Clone for Completion<A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            cancelled: self.cancelled.clone(),
        }
    }
}

impl<A> Debug for Completion<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl<A> Completion<A> {
    pub fn new(dispatcher: Dispatcher<A>) -> Self {
        Self {
            dispatcher,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the operation this completion belongs to has been
    /// cancelled. Tasks may poll this to stop work early.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wrap the task's own `canceller` so that invoking it closes this
    /// completion before tearing down the operation.
    pub fn guard(&self, canceller: Canceller) -> Canceller {
        let cancelled = self.cancelled.clone();
        Canceller::new(move || {
            cancelled.store(true, Ordering::SeqCst);
            canceller.cancel();
        })
    }
}

impl<A: Action> Completion<A> {
    /// Dispatch a result of the task. Middleware which defers the rest
    /// of the chain (see
    /// [MainQueueMiddleware](crate::middleware::main_queue::MainQueueMiddleware))
    /// checks the cancelled flag again before resuming it.
    pub fn dispatch(&self, action: A) -> Dispatched<A> {
        if self.is_cancelled() {
            log::debug!("dropping the completion of a cancelled async action");
            return Dispatched::Stopped;
        }

        let _scope = CompletionScope::enter(CancelFlag(self.cancelled.clone()));
        self.dispatcher.dispatch(action)
    }
}

/// The cancelled flag of the [Completion] whose dispatch is running
/// on the current thread.
#[derive(Debug, Clone)]
pub(crate) struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// `None` unless the current dispatch was made through a
    /// [Completion].
    pub fn current() -> Option<Self> {
        DISPATCHING_COMPLETION.with(|current| current.borrow().clone())
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Marks the current thread as dispatching through a completion until
/// dropped, then restores whatever was marked before.
struct CompletionScope(Option<CancelFlag>);

impl CompletionScope {
    fn enter(flag: CancelFlag) -> Self {
        Self(DISPATCHING_COMPLETION.with(|current| current.replace(Some(flag))))
    }
}

impl Drop for CompletionScope {
    fn drop(&mut self) {
        let previous = self.0.take();
        DISPATCHING_COMPLETION.with(|current| *current.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelFlag, Canceller, Completion};
    use crate::{middleware::MiddlewareContext, Action, DispatchFn, Store};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Ping;

    impl Action for Ping {}

    #[test]
    fn completion_dispatch_is_marked_on_the_current_thread() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_copy = seen.clone();
        let store = Store::builder(|state: &Arc<()>, _: &Ping| state.clone(), ())
            .middleware(
                move |_: &MiddlewareContext<(), Ping>, action: Ping, next: &DispatchFn<Ping>| {
                    let flag = CancelFlag::current().map(|flag| flag.is_raised());
                    seen_copy.lock().unwrap().push(flag);
                    next(action)
                },
            )
            .build();
        let completion = Completion::new(store.dispatcher());

        store.dispatch(Ping);
        completion.dispatch(Ping);
        store.dispatch(Ping);

        assert_eq!(*seen.lock().unwrap(), vec![None, Some(false), None]);
        assert!(CancelFlag::current().is_none());
    }

    #[test]
    fn guarded_canceller_closes_the_completion_first() {
        let store = Store::builder(|state: &Arc<u32>, _: &Ping| Arc::new(**state + 1), 0).build();
        let completion = Completion::new(store.dispatcher());
        let was_closed = Arc::new(Mutex::new(None));

        let was_closed_copy = was_closed.clone();
        let watched = completion.clone();
        let canceller = completion.guard(Canceller::new(move || {
            *was_closed_copy.lock().unwrap() = Some(watched.is_cancelled());
        }));

        assert!(completion.dispatch(Ping).is_reduced());
        canceller.cancel();

        assert_eq!(*was_closed.lock().unwrap(), Some(true));
        assert!(completion.dispatch(Ping).is_stopped());
        assert_eq!(*store.state(), 1);
    }
}
