use std::thread::ThreadId;
use thiserror::Error;

/// Errors surfaced by the redirection machinery around a
/// [Store](crate::Store). Failures of asynchronous work are never
/// reported through this type; they are dispatched as actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The [MainQueue](crate::MainQueue) which should have run the job
    /// has been dropped.
    #[error("the main queue has been closed")]
    QueueClosed,
    /// A redirected dispatch was discarded before it produced a result.
    #[error("the redirected dispatch was abandoned before it completed")]
    Abandoned,
}

/// Panic payload raised when [Store::dispatch()](crate::Store::dispatch())
/// re-enters the reducer step from the thread which is already inside
/// it (for example from within a reducer or a subscriber).
///
/// This is a programming error. It is raised with
/// [std::panic::panic_any] so that it can be told apart from other
/// panics by downcasting the payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("a store can't dispatch an action while it is processing another action on {thread:?}")]
pub struct ReentrantDispatch {
    pub thread: ThreadId,
}
