//! Request contract for the dispatcher.

use std::fmt;

/// Whether a request mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Command,
    Query,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Query => f.write_str("query"),
        }
    }
}

/// A command or query routed through the dispatcher.
///
/// `NAME` identifies the request in logs and in the handler registry, so it
/// must be unique per request type. Commands that set `TRANSACTIONAL` run
/// inside [`UnitOfWork::execute_transaction`](crate::persistence::UnitOfWork::execute_transaction).
///
/// # Examples
/// ```
/// use user_service::application::{Request, RequestKind};
///
/// #[derive(Debug, Clone)]
/// struct Ping;
///
/// impl Request for Ping {
///     type Response = String;
///     const NAME: &'static str = "Ping";
///     const KIND: RequestKind = RequestKind::Query;
/// }
///
/// assert!(!Ping::TRANSACTIONAL);
/// ```
pub trait Request: Clone + fmt::Debug + Send + Sync + 'static {
    /// Success value produced by the handler.
    type Response: Send + 'static;

    const NAME: &'static str;

    const KIND: RequestKind;

    const TRANSACTIONAL: bool = false;
}
