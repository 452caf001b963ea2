//! Request validation stage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::application::{HandlerResult, Request, RequestContext, RuleSet};
use crate::domain::ErrorList;

use super::{Behavior, Next};

/// Runs the request's [`RuleSet`] and short-circuits on any failure.
///
/// With failures, the handler and every later stage are skipped and the
/// outcome carries one `Validation` error per failed rule.
pub struct ValidationBehavior<R> {
    rules: Arc<RuleSet<R>>,
}

impl<R> ValidationBehavior<R> {
    pub fn new(rules: Arc<RuleSet<R>>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl<R: Request> Behavior<R> for ValidationBehavior<R> {
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let failures = self.rules.validate(&request)?;
        match ErrorList::from_vec(failures) {
            Some(errors) => {
                debug!(request = R::NAME, count = errors.len(), "validation failed");
                Ok(Err(errors))
            }
            None => next.run(request, ctx).await,
        }
    }
}
