//! Admin API handlers.
//!
//! Everything except sign-in requires [`RequireAdmin`](crate::middleware::RequireAdmin).

pub mod auth;
pub mod menu;
pub mod records;
