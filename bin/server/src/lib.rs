//! googlefed web server.
//!
//! This crate wires the Google federated login protocol from
//! `googlefed-access` into an Axum application: cookie-backed sessions,
//! the login/callback/logout routes, and extractors for protected pages.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod pages;
pub mod session_store;
