//! String constraint validators.

use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConstraintError;
use crate::validation::ValidationContext;
use crate::value::{TypeTag, Value};

use super::{Constraint, ConstraintKind, ConstraintValidator};

/// Validates that a string contains at least one non-whitespace character.
/// Null is invalid.
pub struct NotBlankValidator;

impl ConstraintValidator for NotBlankValidator {
    fn is_valid(
        &self,
        value: &Value,
        _: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        Ok(value.as_str().map_or(false, |s| !s.trim().is_empty()))
    }
}

/// Validates that the whole string matches the `regexp` attribute.
/// Null is valid.
///
/// Compiled patterns are cached for the lifetime of the validator.
#[derive(Default)]
pub struct PatternValidator {
    cache: RwLock<HashMap<String, Regex>>,
}

impl PatternValidator {
    fn compiled(&self, constraint: &Constraint, pattern: &str) -> Result<Regex, ConstraintError> {
        if let Some(regex) = self.cache.read().get(pattern) {
            return Ok(regex.clone());
        }

        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| constraint.invalid_attribute("regexp", e.to_string()))?;
        self.cache.write().insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

impl ConstraintValidator for PatternValidator {
    fn is_valid(
        &self,
        value: &Value,
        constraint: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        let Some(s) = value.as_str() else {
            return Ok(true);
        };
        let pattern = constraint
            .str_attribute("regexp")?
            .ok_or_else(|| ConstraintError::MissingAttribute {
                kind: constraint.kind().clone(),
                attribute: "regexp",
            })?;
        Ok(self.compiled(constraint, pattern)?.is_match(s))
    }
}

pub(super) fn register_defaults(
    add: &mut dyn FnMut(ConstraintKind, &[TypeTag], Arc<dyn ConstraintValidator>),
) {
    add(ConstraintKind::NOT_BLANK, &[TypeTag::Str], Arc::new(NotBlankValidator));
    add(
        ConstraintKind::PATTERN,
        &[TypeTag::Str],
        Arc::new(PatternValidator::default()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BeanType;

    fn check(
        validator: &dyn ConstraintValidator,
        constraint: &Constraint,
        value: Value,
    ) -> Result<bool, ConstraintError> {
        let context = ValidationContext::detached(BeanType::of::<()>(), &[]);
        validator.is_valid(&value, constraint, &context)
    }

    #[test]
    fn test_not_blank() {
        let constraint = Constraint::not_blank();
        assert_eq!(check(&NotBlankValidator, &constraint, "a".into()), Ok(true));
        assert_eq!(check(&NotBlankValidator, &constraint, "  \t".into()), Ok(false));
        assert_eq!(check(&NotBlankValidator, &constraint, "".into()), Ok(false));
        assert_eq!(check(&NotBlankValidator, &constraint, Value::Null), Ok(false));
    }

    #[test]
    fn test_pattern_matches_whole_string() {
        let validator = PatternValidator::default();
        let constraint = Constraint::pattern(r"\d{3}");

        assert_eq!(check(&validator, &constraint, "123".into()), Ok(true));
        assert_eq!(check(&validator, &constraint, "1234".into()), Ok(false));
        assert_eq!(check(&validator, &constraint, "a123".into()), Ok(false));
        assert_eq!(check(&validator, &constraint, Value::Null), Ok(true));
    }

    #[test]
    fn test_pattern_alternation_is_anchored() {
        let validator = PatternValidator::default();
        let constraint = Constraint::pattern("cat|dog");

        assert_eq!(check(&validator, &constraint, "dog".into()), Ok(true));
        assert_eq!(check(&validator, &constraint, "catalog".into()), Ok(false));
    }

    #[test]
    fn test_pattern_cache_is_reused() {
        let validator = PatternValidator::default();
        let constraint = Constraint::pattern("[a-z]+");

        check(&validator, &constraint, "abc".into()).unwrap();
        check(&validator, &constraint, "def".into()).unwrap();
        assert_eq!(validator.cache.read().len(), 1);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let validator = PatternValidator::default();
        let result = check(&validator, &Constraint::pattern("(unclosed"), "x".into());
        assert!(matches!(
            result,
            Err(ConstraintError::InvalidAttribute { attribute: "regexp", .. })
        ));
    }

    #[test]
    fn test_missing_pattern_is_an_error() {
        let validator = PatternValidator::default();
        let result = check(&validator, &Constraint::new(ConstraintKind::PATTERN), "x".into());
        assert!(matches!(result, Err(ConstraintError::MissingAttribute { .. })));
    }
}
