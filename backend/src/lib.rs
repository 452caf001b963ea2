//! User service core: request dispatching, unit of work, and response
//! mapping.
//!
//! - [`application`]: requests, handlers, behaviors, and the dispatcher.
//! - [`persistence`]: repositories and the unit of work.
//! - [`domain`]: error taxonomy, entities, events, and ports.
//! - [`outbound`]: storage and event adapters.
//! - [`inbound`]: response envelopes and status mapping.

pub mod application;
pub mod bootstrap;
pub mod cancellation;
pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod persistence;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
