//! Handler contract and per-request context.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancellation::CancellationToken;
use crate::domain::ports::StorageError;
use crate::domain::{Entity, Fault, Outcome};
use crate::persistence::{Repository, UnitOfWork};

use super::Request;

/// Result of every pipeline stage: expected failures travel inside the
/// [`Outcome`], exceptional ones as a [`Fault`].
pub type HandlerResult<T> = Result<Outcome<T>, Fault>;

/// State shared by every stage handling one request.
pub struct RequestContext {
    cancellation: CancellationToken,
    unit_of_work: UnitOfWork,
}

impl RequestContext {
    pub const fn new(cancellation: CancellationToken, unit_of_work: UnitOfWork) -> Self {
        Self {
            cancellation,
            unit_of_work,
        }
    }

    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub const fn unit_of_work(&self) -> &UnitOfWork {
        &self.unit_of_work
    }

    /// Shorthand for `unit_of_work().repository::<E>()`.
    pub fn repository<E: Entity>(&self) -> Arc<Repository<E>> {
        self.unit_of_work.repository::<E>()
    }

    /// Persist staged changes, reporting a rejected write as an error value.
    ///
    /// A storage conflict becomes a `Failure` error in the outcome and drops
    /// the rejected changes; any other storage error is a fault.
    pub async fn save_changes(&self) -> HandlerResult<u64> {
        let result = self.unit_of_work.save_changes().await;
        if matches!(result, Err(StorageError::Conflict { .. })) {
            self.unit_of_work.discard_changes().await;
        }
        settle_save(result)
    }
}

/// Split a save result into the outcome and fault channels.
pub fn settle_save(result: Result<u64, StorageError>) -> HandlerResult<u64> {
    match result {
        Ok(affected) => Ok(Ok(affected)),
        Err(error @ StorageError::Conflict { .. }) => Ok(Err(error.to_error().into())),
        Err(error) => Err(error.into()),
    }
}

/// Terminal stage of a pipeline: performs the request.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: R, ctx: &RequestContext) -> HandlerResult<R::Response>;
}
