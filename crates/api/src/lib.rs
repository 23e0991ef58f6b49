//! `sigil-api` — inbound RPC surface for the auth service.

pub mod app;
pub mod config;
