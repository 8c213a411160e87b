//! Numeric constraint validators.
//!
//! Integer bounds (`Min`, `Max`), decimal bounds (`DecimalMin`,
//! `DecimalMax`) and sign checks. Null is valid for all of them.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::ConstraintError;
use crate::validation::ValidationContext;
use crate::value::{TypeTag, Value};

use super::{Constraint, ConstraintKind, ConstraintValidator};

#[derive(Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

/// Validates a number against the integer bound in the `value` attribute.
pub struct IntBoundValidator {
    bound: Bound,
}

impl ConstraintValidator for IntBoundValidator {
    fn is_valid(
        &self,
        value: &Value,
        constraint: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        let limit = constraint.required("value", Constraint::int_attribute)?;
        let valid = match value {
            Value::Int(n) => match self.bound {
                Bound::Lower => *n >= limit,
                Bound::Upper => *n <= limit,
            },
            Value::Float(n) => match self.bound {
                Bound::Lower => *n >= limit as f64,
                Bound::Upper => *n <= limit as f64,
            },
            _ => true,
        };
        Ok(valid)
    }
}

/// Validates a number, or a numeric string, against the decimal bound in
/// the `value` attribute. `inclusive` defaults to true.
pub struct DecimalBoundValidator {
    bound: Bound,
}

impl DecimalBoundValidator {
    fn limit(constraint: &Constraint) -> Result<f64, ConstraintError> {
        match constraint.attribute("value") {
            None => Err(ConstraintError::MissingAttribute {
                kind: constraint.kind().clone(),
                attribute: "value",
            }),
            Some(JsonValue::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                let reason = format!("{} does not represent a valid decimal format", s);
                constraint.invalid_attribute("value", reason)
            }),
            Some(JsonValue::Number(n)) => n.as_f64().ok_or_else(|| {
                constraint.invalid_attribute("value", format!("{} is out of range", n))
            }),
            Some(other) => Err(constraint.invalid_attribute(
                "value",
                format!("{} does not represent a valid decimal format", other),
            )),
        }
    }
}

impl ConstraintValidator for DecimalBoundValidator {
    fn is_valid(
        &self,
        value: &Value,
        constraint: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        if value.is_null() {
            return Ok(true);
        }

        let limit = Self::limit(constraint)?;
        let inclusive = constraint.bool_attribute("inclusive")?.unwrap_or(true);

        let n = match value {
            Value::Int(n) => *n as f64,
            Value::Float(n) => *n,
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(n) => n,
                Err(_) => return Ok(false),
            },
            _ => return Ok(true),
        };

        let valid = match (self.bound, inclusive) {
            (Bound::Lower, true) => n >= limit,
            (Bound::Lower, false) => n > limit,
            (Bound::Upper, true) => n <= limit,
            (Bound::Upper, false) => n < limit,
        };
        Ok(valid)
    }
}

/// Validates the sign of a number.
pub struct SignValidator {
    positive: bool,
    or_zero: bool,
}

impl ConstraintValidator for SignValidator {
    fn is_valid(
        &self,
        value: &Value,
        _: &Constraint,
        _: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        let Some(n) = value.as_f64() else {
            return Ok(true);
        };
        let valid = match (self.positive, self.or_zero) {
            (true, false) => n > 0.0,
            (true, true) => n >= 0.0,
            (false, false) => n < 0.0,
            (false, true) => n <= 0.0,
        };
        Ok(valid)
    }
}

pub(super) fn register_defaults(
    add: &mut dyn FnMut(ConstraintKind, &[TypeTag], Arc<dyn ConstraintValidator>),
) {
    let numbers = [TypeTag::Int, TypeTag::Float];
    let decimals = [TypeTag::Int, TypeTag::Float, TypeTag::Str];

    add(
        ConstraintKind::MIN,
        &numbers,
        Arc::new(IntBoundValidator { bound: Bound::Lower }),
    );
    add(
        ConstraintKind::MAX,
        &numbers,
        Arc::new(IntBoundValidator { bound: Bound::Upper }),
    );
    add(
        ConstraintKind::DECIMAL_MIN,
        &decimals,
        Arc::new(DecimalBoundValidator { bound: Bound::Lower }),
    );
    add(
        ConstraintKind::DECIMAL_MAX,
        &decimals,
        Arc::new(DecimalBoundValidator { bound: Bound::Upper }),
    );

    let signs = [
        (ConstraintKind::POSITIVE, true, false),
        (ConstraintKind::POSITIVE_OR_ZERO, true, true),
        (ConstraintKind::NEGATIVE, false, false),
        (ConstraintKind::NEGATIVE_OR_ZERO, false, true),
    ];
    for (kind, positive, or_zero) in signs {
        add(kind, &numbers, Arc::new(SignValidator { positive, or_zero }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BeanType;

    fn check(
        validator: &dyn ConstraintValidator,
        constraint: &Constraint,
        value: impl Into<Value>,
    ) -> Result<bool, ConstraintError> {
        let context = ValidationContext::detached(BeanType::of::<()>(), &[]);
        validator.is_valid(&value.into(), constraint, &context)
    }

    #[test]
    fn test_min_and_max() {
        let min = IntBoundValidator { bound: Bound::Lower };
        let max = IntBoundValidator { bound: Bound::Upper };

        assert_eq!(check(&min, &Constraint::min(5), 5), Ok(true));
        assert_eq!(check(&min, &Constraint::min(5), 4), Ok(false));
        assert_eq!(check(&min, &Constraint::min(5), 4.5), Ok(false));
        assert_eq!(check(&max, &Constraint::max(10), 10), Ok(true));
        assert_eq!(check(&max, &Constraint::max(10), 11), Ok(false));
        assert_eq!(check(&max, &Constraint::max(10), Value::Null), Ok(true));
    }

    #[test]
    fn test_min_without_value_attribute_is_an_error() {
        let min = IntBoundValidator { bound: Bound::Lower };
        let result = check(&min, &Constraint::new(ConstraintKind::MIN), 1);
        assert!(matches!(result, Err(ConstraintError::MissingAttribute { .. })));
    }

    #[test]
    fn test_decimal_min_inclusive_and_exclusive() {
        let min = DecimalBoundValidator { bound: Bound::Lower };
        let inclusive = Constraint::decimal_min("0.5");
        let exclusive = Constraint::decimal_min("0.5").with_attribute("inclusive", false);

        assert_eq!(check(&min, &inclusive, 0.5), Ok(true));
        assert_eq!(check(&min, &exclusive, 0.5), Ok(false));
        assert_eq!(check(&min, &exclusive, 0.51), Ok(true));
        assert_eq!(check(&min, &inclusive, 0), Ok(false));
    }

    #[test]
    fn test_decimal_max_accepts_numeric_strings() {
        let max = DecimalBoundValidator { bound: Bound::Upper };
        let constraint = Constraint::decimal_max("99.99");

        assert_eq!(check(&max, &constraint, "12.50"), Ok(true));
        assert_eq!(check(&max, &constraint, "100"), Ok(false));
        assert_eq!(check(&max, &constraint, "twelve"), Ok(false));
    }

    #[test]
    fn test_invalid_decimal_bound_is_an_error() {
        let min = DecimalBoundValidator { bound: Bound::Lower };
        let result = check(&min, &Constraint::decimal_min("abc"), 1);
        assert!(matches!(
            result,
            Err(ConstraintError::InvalidAttribute { attribute: "value", .. })
        ));
    }

    #[test]
    fn test_null_skips_bound_parsing() {
        let min = DecimalBoundValidator { bound: Bound::Lower };
        assert_eq!(check(&min, &Constraint::decimal_min("abc"), Value::Null), Ok(true));
    }

    #[test]
    fn test_signs() {
        let constraint = Constraint::positive();
        let positive = SignValidator { positive: true, or_zero: false };
        let positive_or_zero = SignValidator { positive: true, or_zero: true };
        let negative = SignValidator { positive: false, or_zero: false };
        let negative_or_zero = SignValidator { positive: false, or_zero: true };

        assert_eq!(check(&positive, &constraint, 1), Ok(true));
        assert_eq!(check(&positive, &constraint, 0), Ok(false));
        assert_eq!(check(&positive_or_zero, &constraint, 0), Ok(true));
        assert_eq!(check(&negative, &constraint, -0.5), Ok(true));
        assert_eq!(check(&negative, &constraint, 0), Ok(false));
        assert_eq!(check(&negative_or_zero, &constraint, 0), Ok(true));
        assert_eq!(check(&negative_or_zero, &constraint, 1), Ok(false));
        assert_eq!(check(&positive, &constraint, Value::Null), Ok(true));
    }
}
