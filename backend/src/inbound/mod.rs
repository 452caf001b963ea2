//! Inbound adapters translating handler results for callers.

pub mod http;
