//! The validation engine.
//!
//! [`DefaultValidator`] walks a bean graph: it checks the constraints of
//! every constrained property, then cascades into nested beans and container
//! elements, recording one [`ConstraintViolation`] per failed constraint
//! instance.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::constraints::{Constraint, ConstraintValidatorRegistry, Group};
use crate::error::{ConstraintViolation, ConstraintViolations, ValidationError};
use crate::extractors::{ExtractedValue, ValueExtractorRegistry};
use crate::introspection::{
    BeanIntrospection, BeanIntrospector, BeanProperty, IntrospectionRegistry,
};
use crate::validation::{ElementType, TraversableResolver, TraverseAll, ValidationContext};
use crate::value::{BeanRef, BeanType, Value};

/// A graph-traversal validator over introspected beans.
///
/// The validator holds only shared, read-mostly collaborators, so a single
/// instance can serve concurrent calls. Each call builds its own
/// [`ValidationContext`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use verity::{
///     BeanIntrospection, Constraint, DefaultValidator, IntrospectionRegistry, TypeTag, Value,
/// };
///
/// struct Item {
///     name: String,
/// }
///
/// struct Order {
///     items: Vec<Arc<Item>>,
/// }
///
/// let registry = IntrospectionRegistry::new();
/// registry
///     .register(
///         BeanIntrospection::builder::<Item>()
///             .property("name", TypeTag::Str, |i| Value::from(i.name.as_str()))
///             .constraint(Constraint::not_blank())
///             .build(),
///     )
///     .unwrap();
/// registry
///     .register(
///         BeanIntrospection::builder::<Order>()
///             .property("items", TypeTag::List, |o| {
///                 Value::List(o.items.iter().cloned().map(Value::bean).collect())
///             })
///             .cascade()
///             .build(),
///     )
///     .unwrap();
///
/// let validator = DefaultValidator::builder().introspector(registry).build();
/// let order = Order {
///     items: vec![
///         Arc::new(Item { name: "pen".into() }),
///         Arc::new(Item { name: " ".into() }),
///     ],
/// };
///
/// let violations = validator.validate(&Value::bean(Arc::new(order)), &[]).unwrap();
/// assert_eq!(violations.paths(), vec!["items[1].name"]);
/// ```
#[derive(Clone)]
pub struct DefaultValidator {
    introspector: Arc<dyn BeanIntrospector>,
    constraints: ConstraintValidatorRegistry,
    extractors: ValueExtractorRegistry,
    traversable: Arc<dyn TraversableResolver>,
}

impl DefaultValidator {
    /// Creates a validator over `introspector` with the default registries.
    pub fn new(introspector: impl BeanIntrospector + 'static) -> Self {
        Self::builder().introspector(introspector).build()
    }

    /// Starts configuring a validator.
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    /// Returns the constraint registry used by this validator.
    pub fn constraint_registry(&self) -> &ConstraintValidatorRegistry {
        &self.constraints
    }

    /// Returns the extractor registry used by this validator.
    pub fn extractor_registry(&self) -> &ValueExtractorRegistry {
        &self.extractors
    }

    /// Validates `object` and every bean reachable through its cascade
    /// properties.
    ///
    /// Empty `groups` means the default group.
    ///
    /// # Errors
    ///
    /// - `NullArgument` if `object` is null
    /// - `Unintrospectable` if `object` is not a bean with a known introspection
    /// - `ConstraintEvaluation` if a constraint routine fails
    pub fn validate(
        &self,
        object: &Value,
        groups: &[Group],
    ) -> Result<ConstraintViolations, ValidationError> {
        let (bean, introspection) = self.introspect_root(object)?;
        let mut violations = ConstraintViolations::new();

        if introspection.is_unconstrained() {
            return Ok(violations);
        }

        let mut context = ValidationContext::for_root(bean, groups);
        self.validate_bean(&mut context, &introspection, bean, &mut violations)?;
        Ok(violations)
    }

    /// Validates the constraints of one property of `object`, without
    /// cascading.
    ///
    /// An unknown property name yields an empty result.
    ///
    /// # Errors
    ///
    /// Same as [`DefaultValidator::validate`].
    pub fn validate_property(
        &self,
        object: &Value,
        property_name: &str,
        groups: &[Group],
    ) -> Result<ConstraintViolations, ValidationError> {
        let (bean, introspection) = self.introspect_root(object)?;
        let mut violations = ConstraintViolations::new();

        let Some(property) = introspection.property(property_name) else {
            return Ok(violations);
        };

        let mut context = ValidationContext::for_root(bean, groups);
        let value = property.get(bean);
        self.validate_constrained_property(
            &mut context,
            Some(bean),
            property,
            &value,
            &mut violations,
        )?;
        Ok(violations)
    }

    /// Validates `value` as if it were assigned to `property_name` of
    /// `bean_type`.
    ///
    /// # Errors
    ///
    /// - `Unintrospectable` if `bean_type` has no introspection
    /// - `NoSuchProperty` if `bean_type` has no such property
    /// - `ConstraintEvaluation` if a constraint routine fails
    pub fn validate_value(
        &self,
        bean_type: BeanType,
        property_name: &str,
        value: &Value,
        groups: &[Group],
    ) -> Result<ConstraintViolations, ValidationError> {
        let introspection = self
            .introspector
            .find_introspection(&bean_type)
            .ok_or_else(|| ValidationError::Unintrospectable(bean_type.name().to_string()))?;

        let property = introspection
            .property(property_name)
            .ok_or_else(|| ValidationError::NoSuchProperty {
                bean_type: bean_type.name().to_string(),
                property: property_name.to_string(),
            })?;

        let mut violations = ConstraintViolations::new();
        let mut context = ValidationContext::detached(bean_type, groups);
        self.validate_constrained_property(&mut context, None, property, value, &mut violations)?;
        Ok(violations)
    }

    /// Validates independent roots in parallel.
    ///
    /// Results are returned in the order of `objects`; each root is
    /// validated with its own context.
    pub fn validate_all(
        &self,
        objects: &[Value],
        groups: &[Group],
    ) -> Vec<Result<ConstraintViolations, ValidationError>> {
        objects
            .par_iter()
            .map(|object| self.validate(object, groups))
            .collect()
    }

    fn introspect_root<'v>(
        &self,
        object: &'v Value,
    ) -> Result<(&'v BeanRef, Arc<BeanIntrospection>), ValidationError> {
        let bean = match object {
            Value::Null => return Err(ValidationError::NullArgument("object")),
            Value::Bean(bean) => bean,
            other => {
                let type_name = other.runtime_type().map(|t| t.to_string()).unwrap_or_default();
                debug!(type_name = %type_name, "rejecting non-bean root");
                return Err(ValidationError::Unintrospectable(type_name));
            }
        };

        match self.introspector.find_introspection(&bean.bean_type()) {
            Some(introspection) => Ok((bean, introspection)),
            None => {
                debug!(bean_type = %bean.bean_type(), "no introspection registered for root");
                Err(ValidationError::Unintrospectable(bean.bean_type().name().to_string()))
            }
        }
    }

    fn validate_bean(
        &self,
        context: &mut ValidationContext,
        introspection: &BeanIntrospection,
        bean: &BeanRef,
        violations: &mut ConstraintViolations,
    ) -> Result<(), ValidationError> {
        for property in introspection.constrained_properties() {
            let value = property.get(bean);
            self.validate_constrained_property(context, Some(bean), property, &value, violations)?;
        }

        for property in introspection.cascadable_properties() {
            let value = property.get(bean);
            if value.is_null() {
                continue;
            }

            let extractor = value
                .runtime_type()
                .and_then(|tag| self.extractors.find_value_extractor(&tag));

            match extractor {
                Some(extractor) => {
                    extractor.extract_values(&value, &mut |extracted| {
                        self.cascade_element(context, bean, property, extracted, violations)
                    })?;
                }
                None if context.is_visited_value(&value) => {
                    trace!(
                        path = %context.current_path(),
                        property = property.name(),
                        "skipping visited bean"
                    );
                }
                None => {
                    let mut scope = context.push_node(property.name());
                    if self.can_cascade(&scope, &value, ElementType::Field) {
                        self.cascade_to_one(&mut scope, bean, property, &value, violations)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn cascade_element(
        &self,
        context: &mut ValidationContext,
        leaf: &BeanRef,
        property: &BeanProperty,
        extracted: ExtractedValue<'_>,
        violations: &mut ConstraintViolations,
    ) -> Result<(), ValidationError> {
        let value = extracted.value();
        if context.is_visited_value(value) {
            trace!(
                path = %context.current_path(),
                property = property.name(),
                "skipping visited element"
            );
            return Ok(());
        }

        context.enter_container(extracted.container_element());
        let mut scope = context.push_node(property.name());
        if self.can_cascade(&scope, value, ElementType::TypeUse) {
            self.cascade_to_one(&mut scope, leaf, property, value, violations)?;
        }
        Ok(())
    }

    fn can_cascade(
        &self,
        context: &ValidationContext,
        value: &Value,
        element_type: ElementType,
    ) -> bool {
        let path = context.current_path();
        let Some(node) = path.last() else {
            return true;
        };

        let root_type = context.root_type();
        let allowed = self
            .traversable
            .is_cascadable(value, node, root_type, path, element_type)
            && self
                .traversable
                .is_reachable(value, node, root_type, path, element_type);

        if !allowed {
            debug!(path = %path, ?element_type, "cascade vetoed by traversable resolver");
        }
        allowed
    }

    /// Descends into a cascade target at the current path. Targets that are
    /// not introspectable beans are checked against the cascade property's
    /// own constraints instead.
    fn cascade_to_one(
        &self,
        context: &mut ValidationContext,
        leaf: &BeanRef,
        property: &BeanProperty,
        value: &Value,
        violations: &mut ConstraintViolations,
    ) -> Result<(), ValidationError> {
        if let Some(bean) = value.as_bean() {
            if let Some(introspection) = self.introspector.find_introspection(&bean.bean_type()) {
                context.mark_visited(bean);
                if introspection.is_unconstrained() {
                    return Ok(());
                }
                return self.validate_bean(context, &introspection, bean, violations);
            }
        }

        self.evaluate_constraints(context, Some(leaf), property, value, violations)
    }

    fn validate_constrained_property(
        &self,
        context: &mut ValidationContext,
        leaf: Option<&BeanRef>,
        property: &BeanProperty,
        value: &Value,
        violations: &mut ConstraintViolations,
    ) -> Result<(), ValidationError> {
        let scope = context.push_node(property.name());

        let unwrap = if value.is_null() || property.is_cascade() {
            None
        } else {
            value
                .runtime_type()
                .and_then(|tag| self.extractors.find_unwrap_value_extractor(&tag))
        };

        match unwrap {
            Some(extractor) => extractor.extract_values(value, &mut |extracted| {
                self.evaluate_constraints(&scope, leaf, property, extracted.value(), violations)
            })?,
            None => self.evaluate_constraints(&scope, leaf, property, value, violations)?,
        }
        Ok(())
    }

    fn evaluate_constraints(
        &self,
        context: &ValidationContext,
        leaf: Option<&BeanRef>,
        property: &BeanProperty,
        value: &Value,
        violations: &mut ConstraintViolations,
    ) -> Result<(), ValidationError> {
        let groups = context.groups();
        let target = value
            .runtime_type()
            .unwrap_or_else(|| property.declared_type().clone());

        for kind in property.constraint_kinds(groups) {
            let Some(validator) = self.constraints.find_validator(&kind, &target) else {
                trace!(
                    kind = %kind,
                    target = %target,
                    path = %context.current_path(),
                    "no validator, skipping"
                );
                continue;
            };

            for (declaration, constraint) in property.constraints_of(&kind, groups) {
                let valid = validator
                    .is_valid(value, constraint, context)
                    .map_err(|source| ValidationError::ConstraintEvaluation {
                        kind: kind.clone(),
                        path: context.current_path().clone(),
                        source,
                    })?;

                if !valid {
                    self.record(context, leaf, constraint, declaration, value, violations);
                }
            }
        }

        Ok(())
    }

    fn record(
        &self,
        context: &ValidationContext,
        leaf: Option<&BeanRef>,
        constraint: &Constraint,
        declaration: usize,
        value: &Value,
        violations: &mut ConstraintViolations,
    ) {
        let template = constraint.message_template();
        let violation = ConstraintViolation {
            root_bean: context.root_bean().cloned().map(Value::Bean),
            root_bean_type: context.root_type(),
            leaf_bean: leaf.cloned().map(Value::Bean),
            invalid_value: value.clone(),
            message: template.clone(),
            message_template: template,
            property_path: context.current_path().clone(),
            constraint_kind: constraint.kind().clone(),
            constraint: constraint.clone(),
            declaration,
        };
        trace!(
            path = %violation.property_path,
            kind = %violation.constraint_kind,
            "constraint violated"
        );
        violations.insert(violation);
    }
}

impl Default for DefaultValidator {
    /// A validator over an empty introspection registry.
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`DefaultValidator`].
///
/// Unset collaborators default to an empty [`IntrospectionRegistry`], the
/// built-in constraint and extractor registries, and [`TraverseAll`].
#[derive(Default)]
pub struct ValidatorBuilder {
    introspector: Option<Arc<dyn BeanIntrospector>>,
    constraints: Option<ConstraintValidatorRegistry>,
    extractors: Option<ValueExtractorRegistry>,
    traversable: Option<Arc<dyn TraversableResolver>>,
}

impl ValidatorBuilder {
    /// Sets the introspection gateway.
    pub fn introspector(mut self, introspector: impl BeanIntrospector + 'static) -> Self {
        self.introspector = Some(Arc::new(introspector));
        self
    }

    /// Sets a shared introspection gateway.
    pub fn shared_introspector(mut self, introspector: Arc<dyn BeanIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Sets the constraint registry.
    pub fn constraint_registry(mut self, registry: ConstraintValidatorRegistry) -> Self {
        self.constraints = Some(registry);
        self
    }

    /// Sets the value extractor registry.
    pub fn extractor_registry(mut self, registry: ValueExtractorRegistry) -> Self {
        self.extractors = Some(registry);
        self
    }

    /// Sets the resolver consulted before every cascade.
    pub fn traversable_resolver(mut self, resolver: impl TraversableResolver + 'static) -> Self {
        self.traversable = Some(Arc::new(resolver));
        self
    }

    /// Builds the validator.
    pub fn build(self) -> DefaultValidator {
        DefaultValidator {
            introspector: self
                .introspector
                .unwrap_or_else(|| Arc::new(IntrospectionRegistry::new())),
            constraints: self.constraints.unwrap_or_default(),
            extractors: self.extractors.unwrap_or_default(),
            traversable: self.traversable.unwrap_or_else(|| Arc::new(TraverseAll)),
        }
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<DefaultValidator>();
    assert_sync::<DefaultValidator>();
};
