//! Bean introspection: the structural metadata the validator walks.
//!
//! This module provides [`BeanIntrospection`], the per-type description of
//! properties, their constraints and cascade markers, and the
//! [`BeanIntrospector`] gateway the validator uses to find it.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::constraints::{Constraint, ConstraintKind, Group};
use crate::error::RegistryError;
use crate::value::{BeanRef, BeanType, TypeTag, Value};

type Getter = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Value + Send + Sync>;

/// One property of an introspected bean.
#[derive(Clone)]
pub struct BeanProperty {
    name: String,
    declared_type: TypeTag,
    constraints: Vec<Constraint>,
    cascade: bool,
    getter: Getter,
}

impl BeanProperty {
    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type, used for validator lookup when the value
    /// is null.
    pub fn declared_type(&self) -> &TypeTag {
        &self.declared_type
    }

    /// Reads the property from a bean.
    ///
    /// Returns [`Value::Null`] if the bean is not of the introspected type.
    pub fn get(&self, bean: &BeanRef) -> Value {
        (self.getter)(bean.as_any())
    }

    /// Returns true if the property is marked for cascaded validation.
    pub fn is_cascade(&self) -> bool {
        self.cascade
    }

    /// Returns true if the property declares at least one constraint.
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// Returns all declared constraints in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the distinct constraint kinds that apply to `groups`, in
    /// declaration order.
    pub fn constraint_kinds(&self, groups: &[Group]) -> Vec<ConstraintKind> {
        let mut kinds: Vec<ConstraintKind> = Vec::new();
        for constraint in self.constraints.iter().filter(|c| c.applies_to(groups)) {
            if !kinds.contains(constraint.kind()) {
                kinds.push(constraint.kind().clone());
            }
        }
        kinds
    }

    /// Returns the constraint instances of `kind` that apply to `groups`,
    /// each with its position among the property's declarations.
    pub fn constraints_of<'a>(
        &'a self,
        kind: &'a ConstraintKind,
        groups: &'a [Group],
    ) -> impl Iterator<Item = (usize, &'a Constraint)> + 'a {
        self.constraints
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.kind() == kind && c.applies_to(groups))
    }
}

impl fmt::Debug for BeanProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanProperty")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("constraints", &self.constraints)
            .field("cascade", &self.cascade)
            .finish()
    }
}

/// Structural metadata for one bean type.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use verity::{BeanIntrospection, Constraint, TypeTag, Value};
///
/// struct Book {
///     title: String,
///     pages: i64,
/// }
///
/// let introspection = BeanIntrospection::builder::<Book>()
///     .property("title", TypeTag::Str, |b| Value::from(b.title.as_str()))
///     .constraint(Constraint::not_blank())
///     .property("pages", TypeTag::Int, |b| Value::from(b.pages))
///     .constraint(Constraint::positive())
///     .build();
///
/// assert_eq!(introspection.constrained_properties().count(), 2);
/// assert!(introspection.property("title").is_some());
/// assert!(introspection.property("isbn").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct BeanIntrospection {
    bean_type: BeanType,
    properties: IndexMap<String, BeanProperty>,
}

impl BeanIntrospection {
    /// Starts describing the bean type `T`.
    pub fn builder<T: Any + Send + Sync>() -> IntrospectionBuilder<T> {
        IntrospectionBuilder {
            properties: IndexMap::new(),
            current: None,
            _bean: PhantomData,
        }
    }

    /// Returns the introspected bean type.
    pub fn bean_type(&self) -> BeanType {
        self.bean_type
    }

    /// Returns all properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &BeanProperty> {
        self.properties.values()
    }

    /// Returns the properties that declare constraints.
    pub fn constrained_properties(&self) -> impl Iterator<Item = &BeanProperty> {
        self.properties.values().filter(|p| p.is_constrained())
    }

    /// Returns the properties marked for cascaded validation.
    pub fn cascadable_properties(&self) -> impl Iterator<Item = &BeanProperty> {
        self.properties.values().filter(|p| p.is_cascade())
    }

    /// Returns true if the type has nothing to validate.
    pub fn is_unconstrained(&self) -> bool {
        self.constrained_properties().next().is_none()
            && self.cascadable_properties().next().is_none()
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&BeanProperty> {
        self.properties.get(name)
    }
}

/// Builder for a [`BeanIntrospection`] of type `T`.
///
/// `constraint` and `cascade` apply to the most recently added property.
pub struct IntrospectionBuilder<T> {
    properties: IndexMap<String, BeanProperty>,
    current: Option<BeanProperty>,
    _bean: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> IntrospectionBuilder<T> {
    /// Adds a property read by `getter`.
    ///
    /// Declaring a property name twice replaces the earlier declaration.
    pub fn property<F>(mut self, name: impl Into<String>, declared_type: TypeTag, getter: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.finish_current();
        let getter: Getter = Arc::new(move |bean: &(dyn Any + Send + Sync)| {
            bean.downcast_ref::<T>().map_or(Value::Null, &getter)
        });
        self.current = Some(BeanProperty {
            name: name.into(),
            declared_type,
            constraints: Vec::new(),
            cascade: false,
            getter,
        });
        self
    }

    /// Adds a constraint to the current property.
    ///
    /// Ignored when no property has been added yet.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        if let Some(property) = self.current.as_mut() {
            property.constraints.push(constraint);
        }
        self
    }

    /// Marks the current property for cascaded validation.
    pub fn cascade(mut self) -> Self {
        if let Some(property) = self.current.as_mut() {
            property.cascade = true;
        }
        self
    }

    /// Finishes the introspection.
    pub fn build(mut self) -> BeanIntrospection {
        self.finish_current();
        BeanIntrospection {
            bean_type: BeanType::of::<T>(),
            properties: self.properties,
        }
    }

    fn finish_current(&mut self) {
        if let Some(property) = self.current.take() {
            self.properties.insert(property.name.clone(), property);
        }
    }
}

/// Source of bean introspections.
///
/// The validator consults this gateway for every bean it meets. Implementations
/// must be safe to share across concurrent validation calls.
pub trait BeanIntrospector: Send + Sync {
    /// Returns the introspection for `bean_type`, if one is known.
    fn find_introspection(&self, bean_type: &BeanType) -> Option<Arc<BeanIntrospection>>;
}

/// Type alias for the introspection storage map.
type IntrospectionMap = Arc<RwLock<HashMap<TypeId, Arc<BeanIntrospection>>>>;

/// A thread-safe registry of bean introspections.
///
/// Register every bean type at startup; lookups afterwards only take the read
/// lock. Clones share the same storage.
///
/// # Example
///
/// ```rust
/// use verity::{
///     BeanIntrospection, BeanIntrospector, BeanType, IntrospectionRegistry, TypeTag, Value,
/// };
///
/// struct Tag {
///     label: String,
/// }
///
/// let registry = IntrospectionRegistry::new();
/// registry
///     .register(
///         BeanIntrospection::builder::<Tag>()
///             .property("label", TypeTag::Str, |t| Value::from(t.label.as_str()))
///             .build(),
///     )
///     .unwrap();
///
/// assert!(registry.find_introspection(&BeanType::of::<Tag>()).is_some());
/// assert!(registry.find_introspection(&BeanType::of::<String>()).is_none());
/// ```
#[derive(Clone, Default)]
pub struct IntrospectionRegistry {
    introspections: IntrospectionMap,
}

impl IntrospectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an introspection.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateIntrospection` if the bean type is
    /// already registered.
    pub fn register(&self, introspection: BeanIntrospection) -> Result<(), RegistryError> {
        let bean_type = introspection.bean_type();
        let mut introspections = self.introspections.write();

        if introspections.contains_key(&bean_type.type_id()) {
            return Err(RegistryError::DuplicateIntrospection(bean_type.name().to_string()));
        }

        introspections.insert(bean_type.type_id(), Arc::new(introspection));
        Ok(())
    }

    /// Returns the number of registered bean types.
    pub fn len(&self) -> usize {
        self.introspections.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.introspections.read().is_empty()
    }
}

impl BeanIntrospector for IntrospectionRegistry {
    fn find_introspection(&self, bean_type: &BeanType) -> Option<Arc<BeanIntrospection>> {
        self.introspections.read().get(&bean_type.type_id()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        email: String,
        tags: Vec<String>,
    }

    fn account_introspection() -> BeanIntrospection {
        BeanIntrospection::builder::<Account>()
            .property("email", TypeTag::Str, |a| Value::from(a.email.as_str()))
            .constraint(Constraint::not_blank())
            .constraint(Constraint::size(3, 64))
            .constraint(Constraint::size(5, 10).in_groups([Group::new("Strict")]))
            .property("tags", TypeTag::List, |a| Value::list(a.tags.iter().map(String::as_str)))
            .cascade()
            .property("internal", TypeTag::Str, |_| Value::Null)
            .build()
    }

    #[test]
    fn test_property_classification() {
        let introspection = account_introspection();

        let constrained: Vec<_> = introspection
            .constrained_properties()
            .map(|p| p.name())
            .collect();
        let cascadable: Vec<_> = introspection
            .cascadable_properties()
            .map(|p| p.name())
            .collect();

        assert_eq!(constrained, vec!["email"]);
        assert_eq!(cascadable, vec!["tags"]);
        assert_eq!(introspection.properties().count(), 3);
        assert!(!introspection.is_unconstrained());
    }

    #[test]
    fn test_getter_reads_bean() {
        let introspection = account_introspection();
        let bean = BeanRef::new(Arc::new(Account {
            email: "a@b.c".to_string(),
            tags: vec!["x".to_string()],
        }));

        let email = introspection.property("email").unwrap();
        assert_eq!(email.get(&bean), Value::from("a@b.c"));

        let tags = introspection.property("tags").unwrap();
        assert_eq!(tags.get(&bean), Value::list(["x"]));
    }

    #[test]
    fn test_getter_on_foreign_bean_returns_null() {
        let introspection = account_introspection();
        let other = BeanRef::new(Arc::new(42_u8));
        assert!(introspection.property("email").unwrap().get(&other).is_null());
    }

    #[test]
    fn test_constraint_kinds_are_distinct_and_group_filtered() {
        let introspection = account_introspection();
        let email = introspection.property("email").unwrap();

        assert_eq!(
            email.constraint_kinds(&[]),
            vec![ConstraintKind::NOT_BLANK, ConstraintKind::SIZE]
        );
        assert_eq!(email.constraints_of(&ConstraintKind::SIZE, &[]).count(), 1);

        let strict = [Group::new("Strict")];
        assert_eq!(email.constraint_kinds(&strict), vec![ConstraintKind::SIZE]);
        assert_eq!(email.constraints_of(&ConstraintKind::SIZE, &strict).count(), 1);
    }

    #[test]
    fn test_unconstrained_type() {
        let introspection = BeanIntrospection::builder::<Account>()
            .property("email", TypeTag::Str, |a| Value::from(a.email.as_str()))
            .build();
        assert!(introspection.is_unconstrained());
    }

    #[test]
    fn test_constraint_before_any_property_is_ignored() {
        let introspection = BeanIntrospection::builder::<Account>()
            .constraint(Constraint::not_null())
            .cascade()
            .build();
        assert_eq!(introspection.properties().count(), 0);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = IntrospectionRegistry::new();
        registry.register(account_introspection()).unwrap();

        let result = registry.register(account_introspection());
        assert!(matches!(result, Err(RegistryError::DuplicateIntrospection(_))));
        assert_eq!(registry.len(), 1);
    }
}
