//! Error and result types for validation.
//!
//! This module provides the violation records returned by every validation
//! call and the error types for calls that cannot be carried out at all.

mod validation_error;
mod violation;

pub use validation_error::{ConstraintError, RegistryError, ValidationError};
pub use violation::{ConstraintViolation, ConstraintViolations};
