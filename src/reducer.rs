use std::sync::Arc;

/// Using the [reduce()](Reducer::reduce()) method, implementors of
/// this trait take an `Action` submitted to a store via
/// [Store::dispatch()](crate::Store::dispatch()) and produce a new
/// `State` from the previous one.
///
/// Reducers must be total: an action they do not recognise returns
/// the previous state unchanged (cloning the [Arc] is enough), and
/// never panics.
///
/// Any `Fn(&Arc<State>, &Action) -> Arc<State>` closure is a reducer.
pub trait Reducer<State, Action>: Send + Sync {
    /// Take an `Action` submitted to a store via
    /// [Store::dispatch()](crate::Store::dispatch()) and produce the
    /// state which replaces `prev_state`. The previous state is never
    /// mutated.
    fn reduce(&self, prev_state: &Arc<State>, action: &Action) -> Arc<State>;
}

impl<State, Action, F> Reducer<State, Action> for F
where
    F: Fn(&Arc<State>, &Action) -> Arc<State> + Send + Sync,
{
    fn reduce(&self, prev_state: &Arc<State>, action: &Action) -> Arc<State> {
        (self)(prev_state, action)
    }
}

/// A [Reducer] composed of multiple reducers, each applied to the
/// state produced by the one before it.
pub struct CompositeReducer<State, Action> {
    reducers: Vec<Box<dyn Reducer<State, Action>>>,
}

impl<State, Action> CompositeReducer<State, Action> {
    /// Create a new [CompositeReducer].
    pub fn new(reducers: Vec<Box<dyn Reducer<State, Action>>>) -> Self {
        CompositeReducer { reducers }
    }
}

impl<State, Action> Reducer<State, Action> for CompositeReducer<State, Action> {
    fn reduce(&self, prev_state: &Arc<State>, action: &Action) -> Arc<State> {
        self.reducers
            .iter()
            .fold(prev_state.clone(), |state, reducer| reducer.reduce(&state, action))
    }
}

/// Reduces a single field (slice) of an aggregate state.
///
/// The `select` function picks the actions this slice cares about and
/// extracts their payload; `apply` computes the new slice value from
/// the previous one and that payload. Every other action leaves the
/// slice as it was, or yields the default when there is no previous
/// value yet.
///
/// ```
/// use reactive_dispatch::SliceReducer;
///
/// enum BreedAction {
///     Reload(Vec<String>),
///     Alert(String),
/// }
///
/// let breeds = SliceReducer::new(
///     Vec::new(),
///     |action: &BreedAction| match action {
///         BreedAction::Reload(breeds) => Some(breeds.clone()),
///         _ => None,
///     },
///     |_prev: &Vec<String>, breeds| breeds,
/// );
///
/// let prev = vec!["hound".to_string()];
/// assert_eq!(breeds.reduce(Some(&prev), &BreedAction::Alert("oops".into())), prev);
/// assert!(breeds.reduce(None, &BreedAction::Alert("oops".into())).is_empty());
/// ```
pub struct SliceReducer<T, Action, Payload> {
    default: T,
    select: Box<dyn Fn(&Action) -> Option<Payload> + Send + Sync>,
    apply: Box<dyn Fn(&T, Payload) -> T + Send + Sync>,
}

impl<T, Action, Payload> SliceReducer<T, Action, Payload>
where
    T: Clone,
{
    pub fn new<S, F>(default: T, select: S, apply: F) -> Self
    where
        S: Fn(&Action) -> Option<Payload> + Send + Sync + 'static,
        F: Fn(&T, Payload) -> T + Send + Sync + 'static,
    {
        Self {
            default,
            select: Box::new(select),
            apply: Box::new(apply),
        }
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn reduce(&self, prev: Option<&T>, action: &Action) -> T {
        let prev = prev.unwrap_or(&self.default);
        match (self.select)(action) {
            Some(payload) => (self.apply)(prev, payload),
            None => prev.clone(),
        }
    }
}
