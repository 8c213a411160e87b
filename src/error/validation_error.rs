//! Errors raised instead of a violation set.
//!
//! A constraint that is not satisfied never produces one of these; it is
//! recorded as a [`ConstraintViolation`](crate::ConstraintViolation). These
//! errors signal a caller or mapping problem.

use crate::constraints::ConstraintKind;
use crate::path::PropertyPath;

/// Errors that abort a validation call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A required argument was null.
    #[error("argument [{0}] cannot be null")]
    NullArgument(&'static str),

    /// No introspection is registered for the object's type.
    #[error("passed object [{0}] cannot be introspected, register a bean introspection for it")]
    Unintrospectable(String),

    /// The named property does not exist on the bean type.
    #[error("no property [{property}] found on type: {bean_type}")]
    NoSuchProperty {
        bean_type: String,
        property: String,
    },

    /// A constraint validator failed while evaluating.
    #[error("constraint {kind} failed to evaluate at [{path}]: {source}")]
    ConstraintEvaluation {
        kind: ConstraintKind,
        path: PropertyPath,
        #[source]
        source: ConstraintError,
    },
}

/// Errors a constraint validator can raise instead of answering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintError {
    /// The constraint lacks an attribute the validator needs.
    #[error("constraint {kind} requires attribute '{attribute}'")]
    MissingAttribute {
        kind: ConstraintKind,
        attribute: &'static str,
    },

    /// An attribute value could not be used.
    #[error("constraint {kind} has invalid attribute '{attribute}': {reason}")]
    InvalidAttribute {
        kind: ConstraintKind,
        attribute: &'static str,
        reason: String,
    },

    /// Any other failure reported by a custom validator.
    #[error("{0}")]
    Custom(String),
}

impl ConstraintError {
    /// Creates a custom error.
    pub fn custom(message: impl Into<String>) -> Self {
        ConstraintError::Custom(message.into())
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An introspection for the bean type is already registered.
    #[error("introspection for '{0}' already registered")]
    DuplicateIntrospection(String),

    /// A validator for the constraint kind and type is already registered.
    #[error("validator for constraint {kind} on {type_tag} already registered")]
    DuplicateValidator { kind: String, type_tag: String },

    /// A value extractor for the type is already registered.
    #[error("value extractor for {0} already registered")]
    DuplicateExtractor(String),
}
