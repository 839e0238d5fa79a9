//! A single-writer application state store (similar to redux).
//!
//! State lives in a [Store] and is only ever replaced by dispatching
//! an [Action], which travels through the store's
//! [middleware](middleware) chain to its [Reducer]. Subscribers are
//! notified after every completed reduction. Side effects hang off
//! actions as optional capabilities: an [AsyncTask] started by
//! [AsyncActionMiddleware](middleware::async_action::AsyncActionMiddleware),
//! which reports back through fresh dispatches and can be cancelled,
//! or a [Doable] run inline by
//! [DoableMiddleware](middleware::doable::DoableMiddleware).

mod action;
mod async_task;
mod dispatch;
mod error;
mod listener;
mod main_queue;
pub mod middleware;
mod reducer;
mod store;

pub use action::*;
pub use async_task::*;
pub use dispatch::{DispatchFn, Dispatched, Dispatcher, Pending};
pub use error::*;
pub use listener::{AsListener, Callback, Listener, Subscriber, SubscriptionId};
pub use main_queue::*;
pub use reducer::*;
pub use store::{Store, StoreBuilder, StoreRef};
