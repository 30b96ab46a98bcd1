//! Core types for Taxpoint.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod record;
pub mod status;
pub mod validation;

pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{Phone, PhoneError};
pub use record::{RecordKind, UnknownRecordKind};
pub use status::*;
pub use validation::FieldErrors;
