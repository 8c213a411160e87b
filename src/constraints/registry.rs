//! Registry resolving constraint validators by kind and value type.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::value::TypeTag;

use super::{numeric, presence, size, string, ConstraintKind, ConstraintValidator};

type ValidatorMap =
    Arc<RwLock<HashMap<ConstraintKind, HashMap<TypeTag, Arc<dyn ConstraintValidator>>>>>;

/// A thread-safe table of constraint validators.
///
/// Validators are keyed by constraint kind and the [`TypeTag`] of the value
/// they check. A lookup tries the exact tag first, then a validator
/// registered for [`TypeTag::Any`].
///
/// Clones share the same table, so one registry can back many validators.
///
/// # Example
///
/// ```rust
/// use verity::{ConstraintKind, ConstraintValidatorRegistry, TypeTag};
///
/// let registry = ConstraintValidatorRegistry::with_defaults();
/// assert!(registry.find_validator(&ConstraintKind::SIZE, &TypeTag::Str).is_some());
///
/// // NotNull is registered for any type
/// assert!(registry.find_validator(&ConstraintKind::NOT_NULL, &TypeTag::Map).is_some());
///
/// // Positive has no opinion about strings
/// assert!(registry.find_validator(&ConstraintKind::POSITIVE, &TypeTag::Str).is_none());
/// ```
#[derive(Clone)]
pub struct ConstraintValidatorRegistry {
    validators: ValidatorMap,
}

impl ConstraintValidatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            validators: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a registry holding the built-in validators.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        {
            let mut validators = registry.validators.write();
            let mut add = |kind, tags: &[TypeTag], validator: Arc<dyn ConstraintValidator>| {
                let by_type = validators.entry(kind).or_default();
                for tag in tags {
                    by_type.insert(tag.clone(), Arc::clone(&validator));
                }
            };
            presence::register_defaults(&mut add);
            numeric::register_defaults(&mut add);
            size::register_defaults(&mut add);
            string::register_defaults(&mut add);
        }
        registry
    }

    /// Registers a validator for a constraint kind and value type.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateValidator` if a validator is already
    /// registered for the same kind and type.
    pub fn register<V>(
        &self,
        kind: ConstraintKind,
        type_tag: TypeTag,
        validator: V,
    ) -> Result<(), RegistryError>
    where
        V: ConstraintValidator + 'static,
    {
        let mut validators = self.validators.write();
        let by_type = validators.entry(kind.clone()).or_default();

        if by_type.contains_key(&type_tag) {
            return Err(RegistryError::DuplicateValidator {
                kind: kind.to_string(),
                type_tag: type_tag.to_string(),
            });
        }

        by_type.insert(type_tag, Arc::new(validator));
        Ok(())
    }

    /// Finds the validator for `kind` applicable to values of `type_tag`.
    ///
    /// Returns `None` when no validator applies; callers treat that as the
    /// constraint having no opinion on the value.
    pub fn find_validator(
        &self,
        kind: &ConstraintKind,
        type_tag: &TypeTag,
    ) -> Option<Arc<dyn ConstraintValidator>> {
        let validators = self.validators.read();
        let by_type = validators.get(kind)?;
        by_type
            .get(type_tag)
            .or_else(|| by_type.get(&TypeTag::Any))
            .cloned()
    }
}

impl Default for ConstraintValidatorRegistry {
    /// Same as [`ConstraintValidatorRegistry::with_defaults`].
    fn default() -> Self {
        Self::with_defaults()
    }
}
