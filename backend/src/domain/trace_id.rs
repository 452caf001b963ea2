//! Request-scoped trace identifier for response envelopes and logs.
//!
//! The identifier lives in task-local storage so the response mapper can
//! stamp it into every envelope without threading it through handlers.
//! Task-locals are not inherited by spawned tasks; wrap spawned work in
//! [`TraceId::scope`] to carry the identifier across.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Correlation identifier for one request.
///
/// Displays in the compact 32-hex-digit form used in response envelopes.
///
/// # Examples
/// ```
/// use user_service::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().map_err(|e| e.to_string())?.block_on(async {
/// let trace_id = TraceId::generate();
/// let observed = TraceId::scope(trace_id, async { TraceId::current() }).await;
/// assert_eq!(observed, Some(trace_id));
/// # });
/// # Ok::<(), String>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The identifier in scope, if any.
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// The identifier in scope, or a fresh one when nothing is in scope.
    pub fn current_or_generate() -> Self {
        Self::current().unwrap_or_else(Self::generate)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` in scope.
    pub async fn scope<Fut>(trace_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_without_hyphens() {
        let trace_id = TraceId::from_uuid(Uuid::nil());
        assert_eq!(trace_id.to_string(), "00000000000000000000000000000000");
    }

    #[test]
    fn parses_both_uuid_forms() {
        let hyphenated: TraceId = "67e55044-10b1-426f-9247-bb680e5fe0c8"
            .parse()
            .expect("hyphenated uuid");
        let simple: TraceId = "67e5504410b1426f9247bb680e5fe0c8"
            .parse()
            .expect("simple uuid");
        assert_eq!(hyphenated, simple);
    }

    #[tokio::test]
    async fn current_reflects_scope() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn current_or_generate_prefers_scope() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async { TraceId::current_or_generate() }).await;
        assert_eq!(observed, expected);
        assert!(TraceId::current().is_none());
    }
}
