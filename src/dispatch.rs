use crate::{Canceller, DispatchError};
use std::{
    fmt::Debug,
    future::Future,
    pin::Pin,
    sync::{Arc, Weak},
    task::{Context, Poll},
};
use tokio::sync::oneshot;

/// A dispatch function: the store's entry point, or the "next" step
/// handed to a [Middleware](crate::middleware::Middleware).
pub type DispatchFn<A> = Arc<dyn Fn(A) -> Dispatched<A> + Send + Sync>;

/// What came back out of the middleware chain for one dispatched
/// action.
pub enum Dispatched<A> {
    /// The action went through the reducer step, the state was
    /// replaced and subscribers were notified. Carries the action as
    /// it reached the reducer, which middleware may have rewritten.
    Reduced(A),
    /// The action requested an asynchronous operation which was
    /// started instead of being reduced.
    Started(Option<Canceller>),
    /// The chain stopped without reducing anything.
    Stopped,
    /// The rest of the chain was handed over to the main context. The
    /// real outcome arrives through the [Pending].
    Redirected(Pending<A>),
}

impl<A> Dispatched<A> {
    pub fn is_reduced(&self) -> bool {
        matches!(self, Dispatched::Reduced(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Dispatched::Stopped)
    }

    pub fn is_redirected(&self) -> bool {
        matches!(self, Dispatched::Redirected(_))
    }

    /// The action which reached the reducer, if any.
    pub fn into_action(self) -> Option<A> {
        match self {
            Dispatched::Reduced(action) => Some(action),
            _ => None,
        }
    }

    /// The canceller of the started asynchronous operation, if any.
    pub fn into_canceller(self) -> Option<Canceller> {
        match self {
            Dispatched::Started(canceller) => canceller,
            _ => None,
        }
    }
}

impl<A: Debug> Debug for Dispatched<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatched::Reduced(action) => f.debug_tuple("Reduced").field(action).finish(),
            Dispatched::Started(canceller) => f.debug_tuple("Started").field(canceller).finish(),
            Dispatched::Stopped => write!(f, "Stopped"),
            Dispatched::Redirected(pending) => f.debug_tuple("Redirected").field(pending).finish(),
        }
    }
}

/// The outcome of a dispatch which was redirected onto the main
/// context and has not necessarily run yet.
///
/// Await it from async code, or [wait()](Pending::wait()) for it from a
/// thread other than the main one (waiting on the main thread itself
/// deadlocks, as nothing is left to pump the queue).
pub struct Pending<A>(oneshot::Receiver<Dispatched<A>>);

impl<A> Pending<A> {
    pub(crate) fn channel() -> (oneshot::Sender<Dispatched<A>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self(receiver))
    }

    /// Block the current thread until the main context has run the
    /// redirected dispatch.
    ///
    /// Must not be called from within an async runtime.
    pub fn wait(self) -> Result<Dispatched<A>, DispatchError> {
        self.0.blocking_recv().map_err(|_| DispatchError::Abandoned)
    }

    /// The outcome, if the main context has already produced it.
    pub fn try_take(&mut self) -> Option<Result<Dispatched<A>, DispatchError>> {
        match self.0.try_recv() {
            Ok(dispatched) => Some(Ok(dispatched)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(DispatchError::Abandoned)),
        }
    }
}

impl<A> Future for Pending<A> {
    type Output = Result<Dispatched<A>, DispatchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().0)
            .poll(cx)
            .map(|result| result.map_err(|_| DispatchError::Abandoned))
    }
}

impl<A> Debug for Pending<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pending")
    }
}

/// The store side of a [Dispatcher].
pub(crate) trait DispatchEntry<A>: Send + Sync {
    fn dispatch_entry(&self, action: A) -> Dispatched<A>;
}

/// A cloneable handle onto a [Store](crate::Store)'s public dispatch
/// entry point, which can be moved to other threads and kept by
/// middleware and asynchronous tasks.
///
/// The handle does not keep the store alive. Dispatching after the
/// store has been dropped does nothing and returns
/// [Dispatched::Stopped].
pub struct Dispatcher<A> {
    entry: Weak<dyn DispatchEntry<A>>,
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry.clone(),
        }
    }
}

impl<A> Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<A> Dispatcher<A> {
    pub(crate) fn new(entry: Weak<dyn DispatchEntry<A>>) -> Self {
        Self { entry }
    }

    /// Dispatch `action` through the store's full middleware chain.
    pub fn dispatch(&self, action: A) -> Dispatched<A> {
        match self.entry.upgrade() {
            Some(entry) => entry.dispatch_entry(action),
            None => {
                log::debug!("dispatch to a store which has been dropped");
                Dispatched::Stopped
            }
        }
    }

    /// Whether the store behind this handle still exists.
    pub fn is_alive(&self) -> bool {
        self.entry.strong_count() > 0
    }
}
