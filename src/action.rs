use crate::{AsyncTask, Dispatcher};

/// An `Action` describes something which happened, and is dispatched
/// to a [Store](crate::Store) via
/// [Store::dispatch()](crate::Store::dispatch()) in order to produce a
/// new `State`.
///
/// The store never looks inside an action. The only things it asks of
/// one are the two optional side effect capabilities below, which are
/// picked up by [AsyncActionMiddleware](crate::middleware::async_action::AsyncActionMiddleware)
/// and [DoableMiddleware](crate::middleware::doable::DoableMiddleware)
/// respectively. Actions without either capability only need an empty
/// `impl Action for MyAction {}`.
pub trait Action: Sized + Send + 'static {
    /// The asynchronous operation this action requests, if any.
    ///
    /// Called once per pass through the async middleware. The
    /// returned task is started instead of passing the action on to
    /// the reducer; its results come back later as new actions.
    fn async_task(&self) -> Option<AsyncTask<Self>> {
        None
    }

    /// The inline side effect this action performs, if any.
    fn as_doable(&self) -> Option<&dyn Doable<Self>> {
        None
    }
}

impl Action for String {}

impl Action for &'static str {}

/// The result of having run a [Doable] side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction<A> {
    /// Continue down the middleware chain with this action in place
    /// of the one which was dispatched.
    Then(A),
    /// No reaction. The chain stops here and nothing is reduced.
    Stop,
}

impl<A> Reaction<A> {
    pub fn is_stop(&self) -> bool {
        matches!(self, Reaction::Stop)
    }
}

impl<A> From<Option<A>> for Reaction<A> {
    fn from(action: Option<A>) -> Self {
        match action {
            Some(action) => Reaction::Then(action),
            None => Reaction::Stop,
        }
    }
}

/// A side effect which runs inline within the middleware chain, for
/// example reading some other resource, and which rewrites the
/// dispatched action into a [Reaction].
///
/// The `dispatcher` may be used to dispatch further actions, either
/// immediately or later from another thread.
pub trait Doable<A> {
    fn perform(&self, dispatcher: &Dispatcher<A>) -> Reaction<A>;
}
