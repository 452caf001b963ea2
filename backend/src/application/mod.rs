//! Request pipeline: requests, handlers, behaviors, and the dispatcher.
//!
//! Callers build a [`Request`] value and hand it to [`Dispatcher::send`].
//! The dispatcher finds the single [`RequestHandler`] registered for that
//! request type and runs it inside the behavior chain
//! (logging, validation, transaction). Handlers read and write through the
//! request's [`UnitOfWork`](crate::persistence::UnitOfWork).

pub mod behaviors;
mod dispatcher;
mod handler;
mod request;
pub mod users;
mod validation;

pub use dispatcher::Dispatcher;
pub use handler::{HandlerResult, RequestContext, RequestHandler, settle_save};
pub use request::{Request, RequestKind};
pub use validation::{Rule, RuleSet};
