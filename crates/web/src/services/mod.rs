//! Business logic services.
//!
//! # Services
//!
//! - `intake` - Enquiry, subscription and contact form pipelines
//! - `records` - Generic admin CRUD over record kinds
//! - `auth` - Password and Google sign-in for users and admins
//! - `admin_token` - Signed bearer tokens for the admin API
//! - `menu` - JSON-file backed navigation menu
//! - `storage`, `sheets`, `email`, `oauth` - Clients for external services

pub mod admin_token;
pub mod auth;
pub mod email;
pub mod intake;
pub mod menu;
pub mod oauth;
pub mod records;
pub mod sheets;
pub mod storage;
