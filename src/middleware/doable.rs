use super::{Middleware, MiddlewareContext};
use crate::{Action, DispatchFn, Dispatched, Reaction};

/// Runs the [Doable](crate::Doable) side effect of a dispatched action
/// inline, then continues down the chain with whatever it reacted
/// with. A [Reaction::Stop] ends the dispatch with
/// [Dispatched::Stopped].
///
/// Actions which are not doable are passed on unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DoableMiddleware;

impl DoableMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl<S, A: Action> Middleware<S, A> for DoableMiddleware {
    fn on_dispatch(
        &self,
        context: &MiddlewareContext<S, A>,
        action: A,
        next: &DispatchFn<A>,
    ) -> Dispatched<A> {
        let reaction = action
            .as_doable()
            .map(|doable| doable.perform(context.dispatcher()));

        match reaction {
            Some(Reaction::Then(reaction)) => next(reaction),
            Some(Reaction::Stop) => {
                log::trace!("doable action performed with no reaction");
                Dispatched::Stopped
            }
            None => next(action),
        }
    }
}
