//! Routes requests to their registered pipeline.
//!
//! Each request type has exactly one handler. Registration wraps it in the
//! standard behavior chain (logging, then validation when rules are
//! supplied, then transaction) and stores the pipeline keyed by
//! [`Request::NAME`]. [`Dispatcher::send`] creates a fresh unit of work for
//! every request and runs it under a [`TraceId`], reusing the caller's when
//! one is in scope.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{debug, error};

use crate::cancellation::CancellationToken;
use crate::domain::{Fault, TraceId};
use crate::persistence::UnitOfWorkFactory;

use super::behaviors::{
    Behavior, LoggingBehavior, Next, TransactionBehavior, ValidationBehavior,
};
use super::{HandlerResult, Request, RequestContext, RequestHandler, RuleSet};

struct Pipeline<R: Request> {
    behaviors: Vec<Arc<dyn Behavior<R>>>,
    handler: Arc<dyn RequestHandler<R>>,
}

/// Registry of request pipelines.
pub struct Dispatcher {
    unit_of_work: UnitOfWorkFactory,
    pipelines: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Dispatcher {
    pub fn new(unit_of_work: UnitOfWorkFactory) -> Self {
        Self {
            unit_of_work,
            pipelines: HashMap::new(),
        }
    }

    /// Register the handler for `R` without validation rules.
    ///
    /// # Errors
    /// Returns [`Fault::DuplicateHandler`] if `R` already has a handler.
    pub fn register<R, H>(&mut self, handler: H) -> Result<(), Fault>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        self.insert(Pipeline::<R> {
            behaviors: vec![Arc::new(LoggingBehavior), Arc::new(TransactionBehavior)],
            handler: Arc::new(handler),
        })
    }

    /// Register the handler for `R` behind `rules`.
    ///
    /// An empty rule set registers no validation stage.
    ///
    /// # Errors
    /// Returns [`Fault::DuplicateHandler`] if `R` already has a handler.
    pub fn register_validated<R, H>(&mut self, handler: H, rules: RuleSet<R>) -> Result<(), Fault>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let mut behaviors: Vec<Arc<dyn Behavior<R>>> = vec![Arc::new(LoggingBehavior)];
        if !rules.is_empty() {
            behaviors.push(Arc::new(ValidationBehavior::new(Arc::new(rules))));
        }
        behaviors.push(Arc::new(TransactionBehavior));
        self.insert(Pipeline {
            behaviors,
            handler: Arc::new(handler),
        })
    }

    pub fn is_registered<R: Request>(&self) -> bool {
        self.pipelines.contains_key(R::NAME)
    }

    /// Run `request` through its pipeline.
    ///
    /// Expected failures come back inside the outcome. Faults cover missing
    /// handlers, cancellation, and storage or programming failures.
    ///
    /// The outermost stage is always entered, even for a request cancelled
    /// before sending, so the failure is logged.
    ///
    /// # Errors
    /// Returns [`Fault::HandlerNotFound`] if nothing is registered for `R`.
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancellation: &CancellationToken,
    ) -> HandlerResult<R::Response> {
        match TraceId::current() {
            Some(_) => self.dispatch(request, cancellation).await,
            None => {
                TraceId::scope(TraceId::generate(), self.dispatch(request, cancellation)).await
            }
        }
    }

    async fn dispatch<R: Request>(
        &self,
        request: R,
        cancellation: &CancellationToken,
    ) -> HandlerResult<R::Response> {
        let pipeline = match self.pipeline::<R>() {
            Ok(pipeline) => pipeline,
            Err(fault) => {
                error!(
                    request = R::NAME,
                    trace_id = %TraceId::current_or_generate(),
                    error = %fault,
                    "request could not be dispatched"
                );
                return Err(fault);
            }
        };
        let ctx = RequestContext::new(cancellation.clone(), self.unit_of_work.create());
        debug!(request = R::NAME, stages = pipeline.behaviors.len(), "dispatching request");
        Next::new(&pipeline.behaviors, pipeline.handler.as_ref())
            .enter(request, &ctx)
            .await
    }

    fn insert<R: Request>(&mut self, pipeline: Pipeline<R>) -> Result<(), Fault> {
        match self.pipelines.entry(R::NAME) {
            Entry::Occupied(_) => Err(Fault::DuplicateHandler { request: R::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(pipeline));
                Ok(())
            }
        }
    }

    fn pipeline<R: Request>(&self) -> Result<&Pipeline<R>, Fault> {
        let entry = self
            .pipelines
            .get(R::NAME)
            .ok_or(Fault::HandlerNotFound { request: R::NAME })?;
        entry.downcast_ref::<Pipeline<R>>().ok_or_else(|| {
            error!(request = R::NAME, "registered pipeline has a different request type");
            Fault::HandlerNotFound { request: R::NAME }
        })
    }
}
