use std::{
    fmt::Debug,
    sync::{Arc, Weak},
};

/// Something which is notified of changes to [Store](crate::Store)
/// `State`, together with the action which caused them.
///
/// Any `Fn(Arc<State>, &Action)` closure is a subscriber.
pub trait Subscriber<State, Action>: Send + Sync {
    fn notify(&self, state: Arc<State>, action: &Action);
}

impl<State, Action, F> Subscriber<State, Action> for F
where
    F: Fn(Arc<State>, &Action) + Send + Sync,
{
    fn notify(&self, state: Arc<State>, action: &Action) {
        (self)(state, action)
    }
}

/// A trait to take a [Callback] or other custom subscriber type and
/// produce a [Listener], a weak reference to that subscriber.
pub trait AsListener<State, Action> {
    /// Produce a [Listener], a weak reference to this subscriber.
    fn as_listener(&self) -> Listener<State, Action>;
}

/// A reference to a subscriber, as held by the
/// [Store](crate::Store).
///
/// Weak listeners disappear from the store once the strong reference
/// associated with them (usually a [Callback]) is dropped. Strong
/// listeners stay until they are explicitly unsubscribed.
pub enum Listener<State, Action> {
    Weak(Weak<dyn Subscriber<State, Action>>),
    Strong(Arc<dyn Subscriber<State, Action>>),
}

impl<State, Action> Clone for Listener<State, Action> {
    fn clone(&self) -> Self {
        match self {
            Listener::Weak(weak) => Listener::Weak(weak.clone()),
            Listener::Strong(strong) => Listener::Strong(strong.clone()),
        }
    }
}

impl<State, Action> Debug for Listener<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Listener::Weak(_) => write!(f, "Listener::Weak(alive: {})", self.is_alive()),
            Listener::Strong(_) => write!(f, "Listener::Strong"),
        }
    }
}

impl<State, Action> Listener<State, Action> {
    /// Attempt to obtain a [Callback] for this listener, otherwise if
    /// the subscriber has been dropped, returns `None`.
    pub fn as_callback(&self) -> Option<Callback<State, Action>> {
        match self {
            Listener::Weak(weak) => weak.upgrade().map(Callback),
            Listener::Strong(strong) => Some(Callback(strong.clone())),
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Listener::Weak(weak) => weak.strong_count() > 0,
            Listener::Strong(_) => true,
        }
    }
}

impl<State, Action> AsListener<State, Action> for Listener<State, Action> {
    fn as_listener(&self) -> Listener<State, Action> {
        self.clone()
    }
}

/// A wrapper for a callback which is notified of changes to
/// [Store](crate::Store) `State`. Subscribing a `&Callback` registers
/// a weak listener, so the subscription lasts as long as the callback.
pub struct Callback<State, Action>(Arc<dyn Subscriber<State, Action>>);

impl<State, Action> Clone for Callback<State, Action> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<State, Action> Debug for Callback<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback(@ {:p})", Arc::as_ptr(&self.0))
    }
}

impl<State, Action> Callback<State, Action> {
    pub fn new<C>(closure: C) -> Self
    where
        C: Fn(Arc<State>, &Action) + Send + Sync + 'static,
    {
        Self(Arc::new(closure))
    }

    pub fn emit(&self, state: Arc<State>, action: &Action) {
        self.0.notify(state, action)
    }
}

impl<State, Action> AsListener<State, Action> for &Callback<State, Action>
where
    State: 'static,
    Action: 'static,
{
    fn as_listener(&self) -> Listener<State, Action> {
        Listener::Weak(Arc::downgrade(&self.0))
    }
}

impl<State, Action, T> AsListener<State, Action> for &Arc<T>
where
    T: Subscriber<State, Action> + 'static,
{
    fn as_listener(&self) -> Listener<State, Action> {
        let subscriber: Arc<dyn Subscriber<State, Action>> = (*self).clone();
        Listener::Weak(Arc::downgrade(&subscriber))
    }
}

/// Handle returned by [Store::subscribe()](crate::Store::subscribe()),
/// used to [unsubscribe](crate::Store::unsubscribe()).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// The store's subscriber registry, in subscription order.
pub(crate) struct Subscriptions<State, Action> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<State, Action>)>,
}

impl<State, Action> Subscriptions<State, Action> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn insert(&mut self, listener: Listener<State, Action>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let len = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != len
    }

    /// Callbacks for every live listener, dropping the ones whose
    /// subscriber has gone away.
    pub fn live_callbacks(&mut self) -> Vec<Callback<State, Action>> {
        let mut callbacks = Vec::with_capacity(self.listeners.len());
        self.listeners.retain(|(id, listener)| match listener.as_callback() {
            Some(callback) => {
                callbacks.push(callback);
                true
            }
            None => {
                log::trace!("pruning dropped subscriber {:?}", id);
                false
            }
        });
        callbacks
    }
}
