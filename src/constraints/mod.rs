//! Constraint declarations and the validators that check them.
//!
//! A [`Constraint`] is one declared rule on a bean property: a
//! [`ConstraintKind`] plus attributes such as bounds or a pattern. The
//! [`ConstraintValidatorRegistry`] resolves the [`ConstraintValidator`] for a
//! kind and the runtime type of the value being checked.
//!
//! # Example
//!
//! ```rust
//! use verity::{Constraint, ConstraintKind};
//!
//! let size = Constraint::size(1, 20).with_message("name length out of range");
//! assert_eq!(size.kind(), &ConstraintKind::SIZE);
//! assert_eq!(size.message_template(), "name length out of range");
//!
//! let positive = Constraint::positive();
//! assert_eq!(positive.message_template(), "{Positive.message}");
//! ```

mod numeric;
mod presence;
mod registry;
mod size;
mod string;

use std::borrow::Cow;
use std::fmt::{self, Display};

use serde_json::{Map, Value as JsonValue};

use crate::error::ConstraintError;
use crate::validation::ValidationContext;
use crate::value::Value;

pub use registry::ConstraintValidatorRegistry;

/// The kind of a constraint, e.g. `NotNull` or `Size`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintKind(Cow<'static, str>);

impl ConstraintKind {
    pub const NOT_NULL: Self = Self::from_static("NotNull");
    pub const NULL: Self = Self::from_static("Null");
    pub const NOT_EMPTY: Self = Self::from_static("NotEmpty");
    pub const NOT_BLANK: Self = Self::from_static("NotBlank");
    pub const SIZE: Self = Self::from_static("Size");
    pub const MIN: Self = Self::from_static("Min");
    pub const MAX: Self = Self::from_static("Max");
    pub const DECIMAL_MIN: Self = Self::from_static("DecimalMin");
    pub const DECIMAL_MAX: Self = Self::from_static("DecimalMax");
    pub const POSITIVE: Self = Self::from_static("Positive");
    pub const POSITIVE_OR_ZERO: Self = Self::from_static("PositiveOrZero");
    pub const NEGATIVE: Self = Self::from_static("Negative");
    pub const NEGATIVE_OR_ZERO: Self = Self::from_static("NegativeOrZero");
    pub const PATTERN: Self = Self::from_static("Pattern");
    pub const ASSERT_TRUE: Self = Self::from_static("AssertTrue");
    pub const ASSERT_FALSE: Self = Self::from_static("AssertFalse");

    /// Creates a kind from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a kind, typically for a user-defined constraint.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the kind name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validation group a constraint belongs to.
///
/// Constraints without explicit groups belong to [`Group::DEFAULT`], and a
/// call that requests no groups validates the default group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group(Cow<'static, str>);

impl Group {
    pub const DEFAULT: Self = Self(Cow::Borrowed("Default"));

    /// Creates a named group.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the group name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static DEFAULT_GROUPS: [Group; 1] = [Group::DEFAULT];

/// One declared constraint instance on a property.
///
/// A property may carry several instances of the same kind (two `Size`
/// bounds, say); each one is evaluated on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    kind: ConstraintKind,
    attributes: Map<String, JsonValue>,
    groups: Vec<Group>,
}

impl Constraint {
    /// Creates a constraint of `kind` with no attributes.
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            attributes: Map::new(),
            groups: Vec::new(),
        }
    }

    pub fn not_null() -> Self {
        Self::new(ConstraintKind::NOT_NULL)
    }

    pub fn null() -> Self {
        Self::new(ConstraintKind::NULL)
    }

    pub fn not_empty() -> Self {
        Self::new(ConstraintKind::NOT_EMPTY)
    }

    pub fn not_blank() -> Self {
        Self::new(ConstraintKind::NOT_BLANK)
    }

    /// A size bound, both ends inclusive.
    pub fn size(min: usize, max: usize) -> Self {
        Self::new(ConstraintKind::SIZE)
            .with_attribute("min", min)
            .with_attribute("max", max)
    }

    pub fn min(value: i64) -> Self {
        Self::new(ConstraintKind::MIN).with_attribute("value", value)
    }

    pub fn max(value: i64) -> Self {
        Self::new(ConstraintKind::MAX).with_attribute("value", value)
    }

    /// An inclusive decimal lower bound given in decimal notation.
    pub fn decimal_min(value: &str) -> Self {
        Self::new(ConstraintKind::DECIMAL_MIN).with_attribute("value", value)
    }

    /// An inclusive decimal upper bound given in decimal notation.
    pub fn decimal_max(value: &str) -> Self {
        Self::new(ConstraintKind::DECIMAL_MAX).with_attribute("value", value)
    }

    pub fn positive() -> Self {
        Self::new(ConstraintKind::POSITIVE)
    }

    pub fn positive_or_zero() -> Self {
        Self::new(ConstraintKind::POSITIVE_OR_ZERO)
    }

    pub fn negative() -> Self {
        Self::new(ConstraintKind::NEGATIVE)
    }

    pub fn negative_or_zero() -> Self {
        Self::new(ConstraintKind::NEGATIVE_OR_ZERO)
    }

    /// The whole string must match `regexp`.
    pub fn pattern(regexp: &str) -> Self {
        Self::new(ConstraintKind::PATTERN).with_attribute("regexp", regexp)
    }

    pub fn assert_true() -> Self {
        Self::new(ConstraintKind::ASSERT_TRUE)
    }

    pub fn assert_false() -> Self {
        Self::new(ConstraintKind::ASSERT_FALSE)
    }

    /// Sets an attribute and returns self for chaining.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the message attribute and returns self for chaining.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with_attribute("message", message.into())
    }

    /// Assigns the constraint to validation groups.
    pub fn in_groups(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Returns the constraint kind.
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&JsonValue> {
        self.attributes.get(name)
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &Map<String, JsonValue> {
        &self.attributes
    }

    /// Returns the groups the constraint was explicitly assigned to.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns the message template: the `message` attribute, or
    /// `{<Kind>.message}` when none was declared.
    pub fn message_template(&self) -> String {
        self.attribute("message")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{{{}.message}}", self.kind.name()))
    }

    /// Returns true if the constraint belongs to one of the requested groups.
    pub fn applies_to(&self, requested: &[Group]) -> bool {
        let own: &[Group] = if self.groups.is_empty() {
            &DEFAULT_GROUPS
        } else {
            &self.groups
        };
        let requested: &[Group] = if requested.is_empty() {
            &DEFAULT_GROUPS
        } else {
            requested
        };
        own.iter().any(|group| requested.contains(group))
    }

    /// Reads an integer attribute.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError::InvalidAttribute` if the attribute is present
    /// but not an integer.
    pub fn int_attribute(&self, name: &'static str) -> Result<Option<i64>, ConstraintError> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                self.invalid_attribute(name, format!("expected integer, got {}", value))
            }),
        }
    }

    /// Reads a non-negative integer attribute.
    pub fn usize_attribute(&self, name: &'static str) -> Result<Option<usize>, ConstraintError> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| {
                    let reason = format!("expected non-negative integer, got {}", value);
                    self.invalid_attribute(name, reason)
                }),
        }
    }

    /// Reads a boolean attribute.
    pub fn bool_attribute(&self, name: &'static str) -> Result<Option<bool>, ConstraintError> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value.as_bool().map(Some).ok_or_else(|| {
                self.invalid_attribute(name, format!("expected boolean, got {}", value))
            }),
        }
    }

    /// Reads a string attribute.
    pub fn str_attribute(&self, name: &'static str) -> Result<Option<&str>, ConstraintError> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value.as_str().map(Some).ok_or_else(|| {
                self.invalid_attribute(name, format!("expected string, got {}", value))
            }),
        }
    }

    /// Reads an attribute that must be present.
    pub fn required<T>(
        &self,
        name: &'static str,
        read: impl FnOnce(&Self, &'static str) -> Result<Option<T>, ConstraintError>,
    ) -> Result<T, ConstraintError> {
        read(self, name)?.ok_or_else(|| ConstraintError::MissingAttribute {
            kind: self.kind.clone(),
            attribute: name,
        })
    }

    pub(crate) fn invalid_attribute(
        &self,
        name: &'static str,
        reason: impl Into<String>,
    ) -> ConstraintError {
        ConstraintError::InvalidAttribute {
            kind: self.kind.clone(),
            attribute: name,
            reason: reason.into(),
        }
    }
}

/// The validation routine for one constraint kind.
///
/// Implementations must be thread-safe: one instance serves every concurrent
/// validation call.
pub trait ConstraintValidator: Send + Sync {
    /// Checks `value` against `constraint`.
    ///
    /// Returns `Ok(false)` if the value does not satisfy the constraint.
    /// `Err` means the constraint could not be evaluated at all; it aborts
    /// the validation call.
    fn is_valid(
        &self,
        value: &Value,
        constraint: &Constraint,
        context: &ValidationContext,
    ) -> Result<bool, ConstraintError>;
}

/// A [`ConstraintValidator`] backed by a closure. See [`validator_fn`].
pub struct FnValidator<F>(F);

impl<F> ConstraintValidator for FnValidator<F>
where
    F: Fn(&Value, &Constraint, &ValidationContext) -> Result<bool, ConstraintError> + Send + Sync,
{
    fn is_valid(
        &self,
        value: &Value,
        constraint: &Constraint,
        context: &ValidationContext,
    ) -> Result<bool, ConstraintError> {
        (self.0)(value, constraint, context)
    }
}

/// Creates a validator from a closure.
///
/// ```rust
/// use verity::{validator_fn, ConstraintKind, ConstraintValidatorRegistry, TypeTag};
///
/// let registry = ConstraintValidatorRegistry::new();
/// registry
///     .register(
///         ConstraintKind::new("Even"),
///         TypeTag::Int,
///         validator_fn(|value, _, _| Ok(value.as_i64().map_or(true, |n| n % 2 == 0))),
///     )
///     .unwrap();
/// ```
pub fn validator_fn<F>(f: F) -> FnValidator<F>
where
    F: Fn(&Value, &Constraint, &ValidationContext) -> Result<bool, ConstraintError> + Send + Sync,
{
    FnValidator(f)
}
