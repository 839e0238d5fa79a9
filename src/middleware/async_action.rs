//! Runs the [AsyncTask](crate::AsyncTask) attached to an action
//! instead of passing the action on to the reducer.

use super::{Middleware, MiddlewareContext};
use crate::{Action, Completion, DispatchFn, Dispatched};

/// If the dispatched action carries an
/// [async task](crate::Action::async_task()), start it and return
/// [Dispatched::Started] with its canceller, without calling `next`:
/// the action itself is never reduced. The task's results come back
/// later as new top level dispatches through the [Completion] it is
/// given.
///
/// Invoking the returned canceller closes that completion before the
/// task's own teardown runs, so a result which arrives after
/// cancellation is dropped rather than dispatched.
///
/// Actions without an async task are passed on unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsyncActionMiddleware;

impl AsyncActionMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl<S, A: Action> Middleware<S, A> for AsyncActionMiddleware {
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<S, A>,
        action: A,
        next: &DispatchFn<A>,
    ) -> Dispatched<A> {
        match action.async_task() {
            Some(task) => {
                let completion = Completion::new(context.dispatcher().clone());
                let canceller = task.start(completion.clone());
                Dispatched::Started(canceller.map(|canceller| completion.guard(canceller)))
            }
            None => next(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AsyncActionMiddleware;
    use crate::{Action, AsyncTask, Canceller, Completion, Dispatched, Store, StoreRef};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    #[derive(Debug, Clone, Default, PartialEq)]
    struct BreedState {
        fetching: bool,
        breeds: Vec<String>,
        alert: Option<String>,
    }

    /// Stands in for the network: holds on to the completion of the
    /// request in flight so the test decides when it finishes.
    #[derive(Default)]
    struct FakeNetwork {
        request: Mutex<Option<(String, Completion<BreedAction>)>>,
        torn_down: AtomicBool,
    }

    impl FakeNetwork {
        fn respond(&self, breeds: &[&str]) -> Dispatched<BreedAction> {
            let (_, completion) = self.request.lock().unwrap().take().unwrap();
            completion.dispatch(BreedAction::Reload(
                breeds.iter().map(|breed| breed.to_string()).collect(),
            ))
        }

        fn requested_breed(&self) -> Option<String> {
            self.request
                .lock()
                .unwrap()
                .as_ref()
                .map(|(breed, _)| breed.clone())
        }
    }

    #[derive(Clone)]
    enum BreedAction {
        Fetch {
            breed: String,
            network: Arc<FakeNetwork>,
        },
        FetchWithoutCanceller(String),
        Reload(Vec<String>),
        Alert(String),
    }

    impl std::fmt::Debug for BreedAction {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                BreedAction::Fetch { breed, .. } => write!(f, "Fetch({})", breed),
                BreedAction::FetchWithoutCanceller(breed) => {
                    write!(f, "FetchWithoutCanceller({})", breed)
                }
                BreedAction::Reload(breeds) => write!(f, "Reload({:?})", breeds),
                BreedAction::Alert(message) => write!(f, "Alert({})", message),
            }
        }
    }

    impl Action for BreedAction {
        fn async_task(&self) -> Option<AsyncTask<Self>> {
            match self {
                BreedAction::Fetch { breed, network } => {
                    let breed = breed.clone();
                    let network = network.clone();
                    Some(AsyncTask::new(move |completion| {
                        *network.request.lock().unwrap() = Some((breed, completion));
                        Some(Canceller::new(move || {
                            network.torn_down.store(true, Ordering::SeqCst);
                        }))
                    }))
                }
                BreedAction::FetchWithoutCanceller(breed) => {
                    let breed = breed.clone();
                    Some(AsyncTask::new(move |completion| {
                        if breed.is_empty() {
                            completion.dispatch(BreedAction::Alert("no breed given".to_string()));
                        }
                        None
                    }))
                }
                _ => None,
            }
        }
    }

    fn reducer(state: &Arc<BreedState>, action: &BreedAction) -> Arc<BreedState> {
        match action {
            BreedAction::Fetch { .. } | BreedAction::FetchWithoutCanceller(_) => {
                Arc::new(BreedState {
                    fetching: true,
                    ..(**state).clone()
                })
            }
            BreedAction::Reload(breeds) => Arc::new(BreedState {
                fetching: false,
                breeds: breeds.clone(),
                ..(**state).clone()
            }),
            BreedAction::Alert(message) => Arc::new(BreedState {
                fetching: false,
                alert: Some(message.clone()),
                ..(**state).clone()
            }),
        }
    }

    fn store() -> StoreRef<BreedState, BreedAction> {
        Store::builder(reducer, BreedState::default())
            .middleware(AsyncActionMiddleware::new())
            .build()
    }

    fn fetch(breed: &str, network: &Arc<FakeNetwork>) -> BreedAction {
        BreedAction::Fetch {
            breed: breed.to_string(),
            network: network.clone(),
        }
    }

    #[test]
    fn async_action_is_not_reduced_until_completion() {
        let store = store();
        let network = Arc::new(FakeNetwork::default());
        let notifications = Arc::new(Mutex::new(0));
        let notifications_copy = notifications.clone();
        store.subscribe_fn(move |_, _| *notifications_copy.lock().unwrap() += 1);

        let canceller = store.dispatch(fetch("hound", &network)).into_canceller();

        assert!(canceller.is_some());
        assert_eq!(network.requested_breed().as_deref(), Some("hound"));
        assert!(!store.state().fetching);
        assert_eq!(0, *notifications.lock().unwrap());

        let result = network.respond(&["hound1", "hound2"]);

        assert!(result.is_reduced());
        assert_eq!(store.state().breeds, vec!["hound1", "hound2"]);
        assert_eq!(1, *notifications.lock().unwrap());
    }

    #[test]
    fn completion_after_cancel_is_ignored() {
        let store = store();
        let network = Arc::new(FakeNetwork::default());

        let canceller = store
            .dispatch(fetch("hound", &network))
            .into_canceller()
            .unwrap();
        canceller.cancel();
        assert!(network.torn_down.load(Ordering::SeqCst));

        let result = network.respond(&["hound1", "hound2"]);

        assert!(result.is_stopped());
        assert!(store.state().breeds.is_empty());
    }

    #[test]
    fn dropping_the_canceller_lets_the_operation_complete() {
        let store = store();
        let network = Arc::new(FakeNetwork::default());

        drop(store.dispatch(fetch("hound", &network)));
        network.respond(&["hound1"]);

        assert!(!network.torn_down.load(Ordering::SeqCst));
        assert_eq!(store.state().breeds, vec!["hound1"]);
    }

    #[test]
    fn task_may_complete_synchronously() {
        let store = store();

        let result = store.dispatch(BreedAction::FetchWithoutCanceller(String::new()));

        match result {
            Dispatched::Started(None) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(store.state().alert.as_deref(), Some("no breed given"));
        assert!(!store.state().fetching);
    }

    #[test]
    fn plain_actions_pass_through() {
        let store = store();

        let result = store.dispatch(BreedAction::Alert("hello".to_string()));

        assert!(result.is_reduced());
        assert_eq!(store.state().alert.as_deref(), Some("hello"));
    }

    #[test]
    fn async_payload_reaches_reducer_without_the_middleware() {
        let store = StoreRef::new(reducer, BreedState::default(), Vec::new());
        let network = Arc::new(FakeNetwork::default());

        assert!(store.dispatch(fetch("hound", &network)).is_reduced());
        assert!(store.state().fetching);
        assert!(network.requested_breed().is_none());
    }
}
