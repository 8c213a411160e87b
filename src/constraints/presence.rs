//! Presence and boolean constraint validators.

use std::sync::Arc;

use crate::error::ConstraintError;
use crate::validation::ValidationContext;
use crate::value::{TypeTag, Value};

use super::{Constraint, ConstraintKind, ConstraintValidator};

/// Validates that a value is present.
pub struct NotNullValidator;

impl ConstraintValidator for NotNullValidator {
    fn is_valid(
        &self,
        value: &Value,
        _: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        Ok(!value.is_null())
    }
}

/// Validates that a value is absent.
pub struct NullValidator;

impl ConstraintValidator for NullValidator {
    fn is_valid(
        &self,
        value: &Value,
        _: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        Ok(value.is_null())
    }
}

/// Validates a boolean against the expected truth value. Null is valid.
pub struct AssertValidator {
    expected: bool,
}

impl ConstraintValidator for AssertValidator {
    fn is_valid(
        &self,
        value: &Value,
        _: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        Ok(value.as_bool().map_or(true, |b| b == self.expected))
    }
}

pub(super) fn register_defaults(
    add: &mut dyn FnMut(ConstraintKind, &[TypeTag], Arc<dyn ConstraintValidator>),
) {
    add(ConstraintKind::NOT_NULL, &[TypeTag::Any], Arc::new(NotNullValidator));
    add(ConstraintKind::NULL, &[TypeTag::Any], Arc::new(NullValidator));
    add(
        ConstraintKind::ASSERT_TRUE,
        &[TypeTag::Bool],
        Arc::new(AssertValidator { expected: true }),
    );
    add(
        ConstraintKind::ASSERT_FALSE,
        &[TypeTag::Bool],
        Arc::new(AssertValidator { expected: false }),
    );
}
