use crate::DispatchError;
use std::{
    fmt::Debug,
    marker::PhantomData,
    rc::Rc,
    thread::{self, ThreadId},
};
use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send>;

/// The designated "main" execution context: the thread on which all
/// state mutation and subscriber notification is meant to happen.
///
/// Work posted from other threads through a [MainHandle] is queued
/// and runs, in the order it was posted, when the owner of the queue
/// pumps it with [run_pending()](MainQueue::run_pending()) or
/// [run_next()](MainQueue::run_next()), typically from its event
/// loop. A `MainQueue` cannot leave the thread which created it.
pub struct MainQueue {
    thread: ThreadId,
    sender: mpsc::UnboundedSender<Job>,
    receiver: mpsc::UnboundedReceiver<Job>,
    _not_send: PhantomData<Rc<()>>,
}

impl MainQueue {
    /// Create a queue, designating the current thread as the main one.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            thread: thread::current().id(),
            sender,
            receiver,
            _not_send: PhantomData,
        }
    }

    pub fn handle(&self) -> MainHandle {
        MainHandle {
            thread: self.thread,
            sender: self.sender.clone(),
        }
    }

    /// Run every job which has been posted so far without blocking.
    /// Returns how many jobs ran.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            count += 1;
        }
        count
    }

    /// Block until a job has been posted, then run it.
    ///
    /// Must not be called from within an async runtime.
    pub fn run_next(&mut self) {
        // The queue holds a sender itself, so the channel never closes
        // while it is being received from.
        if let Some(job) = self.receiver.blocking_recv() {
            job();
        }
    }

    /// Run jobs as they arrive until `done` returns `true`.
    pub fn run_until<F: FnMut() -> bool>(&mut self, mut done: F) {
        self.run_pending();
        while !done() {
            self.run_next();
        }
    }
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MainQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainQueue")
            .field("thread", &self.thread)
            .finish_non_exhaustive()
    }
}

/// A cloneable, thread safe handle onto a [MainQueue].
#[derive(Clone)]
pub struct MainHandle {
    thread: ThreadId,
    sender: mpsc::UnboundedSender<Job>,
}

impl MainHandle {
    /// Whether the calling thread is the main one.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    /// Queue `job` to run on the main thread.
    pub fn post<F: FnOnce() + Send + 'static>(&self, job: F) -> Result<(), DispatchError> {
        self.sender
            .send(Box::new(job))
            .map_err(|_| DispatchError::QueueClosed)
    }
}

impl Debug for MainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainHandle")
            .field("thread", &self.thread)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
