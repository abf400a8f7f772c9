//! Smart Task Backend Library
//!
//! Cookie-session authentication core for the Smart Task backend: encrypted
//! dual tokens, single-use refresh rotation, the HTTP gate and the WebSocket
//! handshake that share it.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod websocket;

#[cfg(test)]
pub(crate) mod test_support;
