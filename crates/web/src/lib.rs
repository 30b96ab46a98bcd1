//! Taxpoint web server library.
//!
//! Public intake API, user authentication and the admin API, exposed as a
//! library so the server binary and tests build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
