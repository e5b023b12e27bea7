//! HTTP API: routing, request/response mapping, and service wiring.

pub mod app;
pub mod middleware;
