//! HTTP route definitions
//!
//! The primary API is GraphQL at /graphql, wired in [crate::app].
//! Only liveness and readiness checks live here.

pub mod health;
