//! Cross-cutting stages wrapped around every request handler.
//!
//! A pipeline is an ordered list of [`Behavior`]s ending in a
//! [`RequestHandler`]. Each behavior receives the request and a [`Next`]
//! continuation; calling [`Next::run`] invokes the rest of the chain, and not
//! calling it short-circuits. The dispatcher builds pipelines in the order
//! logging, validation, transaction, handler.
//!
//! Cancellation is checked before every stage after the outermost one, so
//! the outermost stage always observes a cancelled request and later stages
//! are never entered once it is cancelled.

use std::sync::Arc;

use async_trait::async_trait;

use super::{HandlerResult, Request, RequestContext, RequestHandler};

mod logging;
mod transaction;
mod validation;

pub use logging::LoggingBehavior;
pub use transaction::TransactionBehavior;
pub use validation::ValidationBehavior;

/// One stage of a request pipeline.
#[async_trait]
pub trait Behavior<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response>;
}

/// The remainder of a pipeline after the current stage.
pub struct Next<'a, R: Request> {
    behaviors: &'a [Arc<dyn Behavior<R>>],
    handler: &'a dyn RequestHandler<R>,
}

impl<R: Request> Clone for Next<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Request> Copy for Next<'_, R> {}

impl<'a, R: Request> Next<'a, R> {
    pub(crate) fn new(
        behaviors: &'a [Arc<dyn Behavior<R>>],
        handler: &'a dyn RequestHandler<R>,
    ) -> Self {
        Self { behaviors, handler }
    }

    /// Run the remaining stages.
    ///
    /// # Errors
    /// Returns [`Fault::Cancelled`](crate::domain::Fault::Cancelled) when the
    /// request was cancelled before the next stage, or whatever fault a later
    /// stage raises.
    pub async fn run(self, request: R, ctx: &RequestContext) -> HandlerResult<R::Response> {
        ctx.cancellation().check()?;
        self.enter(request, ctx).await
    }

    /// Run the remaining stages without checking for cancellation first.
    pub(crate) async fn enter(self, request: R, ctx: &RequestContext) -> HandlerResult<R::Response> {
        match self.behaviors.split_first() {
            Some((current, rest)) => {
                current
                    .handle(request, ctx, Next::new(rest, self.handler))
                    .await
            }
            None => {
                ctx.cancellation().check()?;
                self.handler.handle(request, ctx).await
            }
        }
    }
}
