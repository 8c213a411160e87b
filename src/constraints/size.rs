//! Size and emptiness constraint validators.

use std::sync::Arc;

use crate::error::ConstraintError;
use crate::validation::ValidationContext;
use crate::value::{TypeTag, Value};

use super::{Constraint, ConstraintKind, ConstraintValidator};

const DEFAULT_MAX_SIZE: usize = i32::MAX as usize;

/// Validates that the size of a string, byte array or container lies within
/// `min` (default 0) and `max` (default `i32::MAX`). Null is valid.
pub struct SizeValidator;

impl ConstraintValidator for SizeValidator {
    fn is_valid(
        &self,
        value: &Value,
        constraint: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        let Some(size) = value.size() else {
            return Ok(true);
        };
        let min = constraint.usize_attribute("min")?.unwrap_or(0);
        let max = constraint.usize_attribute("max")?.unwrap_or(DEFAULT_MAX_SIZE);
        Ok(size >= min && size <= max)
    }
}

/// Validates that a string, byte array or container has at least one
/// element. Null is invalid.
pub struct NotEmptyValidator;

impl ConstraintValidator for NotEmptyValidator {
    fn is_valid(
        &self,
        value: &Value,
        _: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        Ok(value.size().map_or(false, |size| size > 0))
    }
}

pub(super) fn register_defaults(
    add: &mut dyn FnMut(ConstraintKind, &[TypeTag], Arc<dyn ConstraintValidator>),
) {
    let sized = [
        TypeTag::Str,
        TypeTag::Bytes,
        TypeTag::List,
        TypeTag::Set,
        TypeTag::Map,
    ];
    add(ConstraintKind::SIZE, &sized, Arc::new(SizeValidator));
    add(ConstraintKind::NOT_EMPTY, &sized, Arc::new(NotEmptyValidator));
}
