//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can reject a request early or attach context for the handler.

/// Administrator check for privileged endpoints
pub mod admin;
