//! Constraint violation types.
//!
//! This module provides [`ConstraintViolation`] for single constraint failures
//! and [`ConstraintViolations`], the set returned by every validation call.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use indexmap::IndexSet;
use stillwater::prelude::*;
use stillwater::Validation;

use crate::constraints::{Constraint, ConstraintKind};
use crate::path::PropertyPath;
use crate::value::{BeanType, Value};

/// A single constraint failure with full context.
///
/// `ConstraintViolation` captures all relevant information about a failure:
/// - **root_bean**: The bean passed to the validator (absent for value checks)
/// - **leaf_bean**: The bean whose property failed (the root or a descendant)
/// - **invalid_value**: The value that did not satisfy the constraint
/// - **property_path**: Snapshot of the path from the root to the value
/// - **message_template**: The constraint's message, uninterpolated
/// - **constraint**: The failed constraint instance and its attributes
///
/// Violations are immutable once recorded. Two failed instances of one kind
/// on the same value yield two violations, even when their messages match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub(crate) root_bean: Option<Value>,
    pub(crate) root_bean_type: BeanType,
    pub(crate) leaf_bean: Option<Value>,
    pub(crate) invalid_value: Value,
    pub(crate) message: String,
    pub(crate) message_template: String,
    pub(crate) property_path: PropertyPath,
    pub(crate) constraint_kind: ConstraintKind,
    pub(crate) constraint: Constraint,
    /// Position of the constraint among its property's declarations.
    pub(crate) declaration: usize,
}

impl ConstraintViolation {
    /// Returns the validated root bean, if the call had one.
    pub fn root_bean(&self) -> Option<&Value> {
        self.root_bean.as_ref()
    }

    /// Returns the type of the validated root bean.
    pub fn root_bean_type(&self) -> BeanType {
        self.root_bean_type
    }

    /// Returns the bean owning the failing property.
    pub fn leaf_bean(&self) -> Option<&Value> {
        self.leaf_bean.as_ref()
    }

    /// Returns the value that failed the constraint.
    pub fn invalid_value(&self) -> &Value {
        &self.invalid_value
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the message template the message was produced from.
    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    /// Returns the path from the root bean to the failing value.
    pub fn property_path(&self) -> &PropertyPath {
        &self.property_path
    }

    /// Returns the kind of the failed constraint.
    pub fn constraint_kind(&self) -> &ConstraintKind {
        &self.constraint_kind
    }

    /// Returns the failed constraint instance.
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }
}

// Attributes are left out of the hash; equal violations still hash equally.
impl Hash for ConstraintViolation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root_bean.hash(state);
        self.root_bean_type.hash(state);
        self.leaf_bean.hash(state);
        self.invalid_value.hash(state);
        self.message.hash(state);
        self.message_template.hash(state);
        self.property_path.hash(state);
        self.constraint_kind.hash(state);
        self.declaration.hash(state);
    }
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path_str = if self.property_path.is_root() {
            "(root)".to_string()
        } else {
            self.property_path.to_string()
        };

        write!(f, "{}: {} (got: {})", path_str, self.message, self.invalid_value)
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ConstraintViolation>();
    assert_sync::<ConstraintViolation>();
};

/// The set of violations produced by one validation call.
///
/// Iteration follows insertion order during traversal. A violation equal to
/// one already recorded is not added twice.
///
/// # Combining Results
///
/// `ConstraintViolations` implements `Semigroup`, so results of separate
/// calls can be merged:
///
/// ```rust
/// use verity::ConstraintViolations;
/// use stillwater::prelude::*;
///
/// let combined = ConstraintViolations::new().combine(ConstraintViolations::new());
/// assert!(combined.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintViolations(IndexSet<ConstraintViolation>);

impl ConstraintViolations {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation. Returns false if an equal one was already present.
    pub(crate) fn insert(&mut self, violation: ConstraintViolation) -> bool {
        self.0.insert(violation)
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no constraint was violated.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the violations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.0.iter()
    }

    /// Returns all violations whose rendered path equals `path`.
    pub fn at_path(&self, path: &str) -> Vec<&ConstraintViolation> {
        self.0
            .iter()
            .filter(|v| v.property_path.to_string() == path)
            .collect()
    }

    /// Returns all violations of the given constraint kind.
    pub fn with_kind(&self, kind: &ConstraintKind) -> Vec<&ConstraintViolation> {
        self.0
            .iter()
            .filter(|v| &v.constraint_kind == kind)
            .collect()
    }

    /// Returns the rendered paths of all violations, in order.
    pub fn paths(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|v| v.property_path.to_string())
            .collect()
    }

    /// Converts this set into a `Vec<ConstraintViolation>`.
    pub fn into_vec(self) -> Vec<ConstraintViolation> {
        self.0.into_iter().collect()
    }

    /// Converts the result into a `Validation`, failing when non-empty.
    ///
    /// ```rust
    /// use verity::ConstraintViolations;
    ///
    /// let validation = ConstraintViolations::new().into_validation("order-1");
    /// assert!(validation.is_success());
    /// ```
    pub fn into_validation<T>(self, value: T) -> Validation<T, ConstraintViolations> {
        if self.is_empty() {
            Validation::Success(value)
        } else {
            Validation::Failure(self)
        }
    }
}

impl Semigroup for ConstraintViolations {
    fn combine(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }
}

impl Display for ConstraintViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} violation(s):", self.len())?;
        for (i, violation) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, violation)?;
        }
        Ok(())
    }
}

impl IntoIterator for ConstraintViolations {
    type Item = ConstraintViolation;
    type IntoIter = indexmap::set::IntoIter<ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConstraintViolations {
    type Item = &'a ConstraintViolation;
    type IntoIter = indexmap::set::Iter<'a, ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
