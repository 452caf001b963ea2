//! Transaction stage.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::application::{HandlerResult, Request, RequestContext};

use super::{Behavior, Next};

/// Wraps the rest of the pipeline in a unit-of-work transaction for
/// requests marked [`Request::TRANSACTIONAL`]; other requests pass through.
///
/// A transient storage failure reruns the remaining stages with a fresh
/// clone of the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionBehavior;

#[async_trait]
impl<R: Request> Behavior<R> for TransactionBehavior {
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        if !R::TRANSACTIONAL {
            return next.run(request, ctx).await;
        }
        info!(request = R::NAME, "beginning transaction");
        let result = ctx
            .unit_of_work()
            .execute_transaction(ctx.cancellation(), || next.run(request.clone(), ctx))
            .await;
        match &result {
            Ok(_) => info!(request = R::NAME, "transaction committed"),
            Err(fault) if fault.is_cancelled() => {
                warn!(request = R::NAME, "transaction abandoned after cancellation");
            }
            Err(fault) => error!(request = R::NAME, error = %fault, "transaction failed"),
        }
        result
    }
}
