//! # Verity
//!
//! A constraint validator that walks a graph of beans, applying declared
//! constraints and cascading into nested beans and container elements.
//!
//! ## Overview
//!
//! Beans are described once through a [`BeanIntrospection`]: each property
//! has a getter, its declared constraints and an optional cascade marker. The
//! [`DefaultValidator`] reads that metadata, resolves a
//! [`ConstraintValidator`] per constraint kind and runtime value type, and
//! collects every failure into a [`ConstraintViolations`] set. A failed
//! constraint is never an error; errors are reserved for calls that cannot be
//! carried out, such as validating a type with no introspection.
//!
//! Cascading follows lists, sets, maps and optionals through value
//! extractors, tags each element with its index or key, and visits every bean
//! instance at most once per call, so cyclic graphs terminate.
//!
//! ## Core Types
//!
//! - [`Value`]: dynamic property values, including shared beans
//! - [`PropertyPath`]: the rendered location of a failure (e.g. `items[1].name`)
//! - [`Constraint`]: a declared rule with its kind, attributes and groups
//! - [`ConstraintViolation`]: one failure with its path, value and template
//! - [`DefaultValidator`]: the traversal engine
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use verity::{
//!     BeanIntrospection, Constraint, DefaultValidator, IntrospectionRegistry, TypeTag, Value,
//! };
//!
//! struct User {
//!     email: String,
//!     age: i64,
//! }
//!
//! let registry = IntrospectionRegistry::new();
//! registry
//!     .register(
//!         BeanIntrospection::builder::<User>()
//!             .property("email", TypeTag::Str, |u| Value::from(u.email.as_str()))
//!             .constraint(Constraint::pattern(r"[^@]+@[^@]+"))
//!             .property("age", TypeTag::Int, |u| Value::from(u.age))
//!             .constraint(Constraint::min(18))
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let validator = DefaultValidator::new(registry);
//! let user = Value::bean(Arc::new(User {
//!     email: "nobody".to_string(),
//!     age: 12,
//! }));
//!
//! let violations = validator.validate(&user, &[]).unwrap();
//! assert_eq!(violations.paths(), vec!["email", "age"]);
//! ```

pub mod constraints;
pub mod error;
pub mod extractors;
pub mod introspection;
pub mod path;
pub mod validation;
pub mod validator;
pub mod value;

pub use constraints::{
    validator_fn, Constraint, ConstraintKind, ConstraintValidator, ConstraintValidatorRegistry,
    FnValidator, Group,
};
pub use error::{
    ConstraintError, ConstraintViolation, ConstraintViolations, RegistryError, ValidationError,
};
pub use extractors::{ExtractedValue, ValueExtractor, ValueExtractorRegistry, ValueReceiver};
pub use introspection::{
    BeanIntrospection, BeanIntrospector, BeanProperty, IntrospectionBuilder, IntrospectionRegistry,
};
pub use path::{ContainerElement, ElementKind, PathNode, PropertyPath};
pub use validation::{ElementType, TraversableResolver, TraverseAll, ValidationContext};
pub use validator::{DefaultValidator, ValidatorBuilder};
pub use value::{BeanId, BeanRef, BeanType, TypeTag, Value};

/// Type alias for validation call results.
pub type ValidationResult = Result<ConstraintViolations, ValidationError>;
