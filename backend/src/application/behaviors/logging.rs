//! Request logging.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info};

use crate::application::{HandlerResult, Request, RequestContext};
use crate::domain::{Error, TraceId};

use super::{Behavior, Next};

/// Logs entry, outcome, and elapsed time of every request.
///
/// Error outcomes and faults both log at `error`; an error outcome carries
/// the error codes and the whole error list as fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

#[async_trait]
impl<R: Request> Behavior<R> for LoggingBehavior {
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let trace_id = TraceId::current().map(|id| id.to_string());
        let started = Instant::now();
        info!(
            request = R::NAME,
            kind = %R::KIND,
            trace_id = trace_id.as_deref(),
            "handling request"
        );

        let result = next.run(request, ctx).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(Ok(_)) => info!(request = R::NAME, elapsed_ms, "request succeeded"),
            Ok(Err(errors)) => {
                let codes: Vec<&str> = errors.iter().map(Error::code).collect();
                error!(
                    request = R::NAME,
                    elapsed_ms,
                    error_count = errors.len(),
                    error_codes = ?codes,
                    errors = ?errors,
                    "request returned errors"
                );
            }
            Err(fault) => error!(
                request = R::NAME,
                elapsed_ms,
                error = %fault,
                "request failed"
            ),
        }
        result
    }
}
