//! Per-call validation state and the traversal gate.
//!
//! This module provides the [`ValidationContext`] owned by one validation
//! call, and the [`TraversableResolver`] seam consulted before every cascade.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use crate::constraints::Group;
use crate::path::{ContainerElement, PathNode, PropertyPath};
use crate::value::{BeanId, BeanRef, BeanType, Value};

/// Mutable state of a single validation call.
///
/// The context carries the visited beans that guard against cycles, the
/// current property path, and the pending container marker that tags the
/// next pushed node as a container element.
///
/// A context is created for each call and never shared between calls.
/// Constraint routines receive it by shared reference and can only read it.
#[derive(Debug)]
pub struct ValidationContext {
    root_bean: Option<BeanRef>,
    root_type: BeanType,
    groups: Vec<Group>,
    // Holds each visited bean so its address cannot be reused by a later
    // allocation while the call runs.
    visited: HashMap<BeanId, BeanRef>,
    path: PropertyPath,
    container: Option<ContainerElement>,
}

impl ValidationContext {
    /// Creates a context for validating `root`, with the root already
    /// marked visited.
    pub(crate) fn for_root(root: &BeanRef, groups: &[Group]) -> Self {
        let mut visited = HashMap::new();
        visited.insert(root.id(), root.clone());
        Self {
            root_bean: Some(root.clone()),
            root_type: root.bean_type(),
            groups: groups.to_vec(),
            visited,
            path: PropertyPath::root(),
            container: None,
        }
    }

    /// Creates a context with no root instance, as used when checking a
    /// candidate value against a property of `root_type`.
    pub fn detached(root_type: BeanType, groups: &[Group]) -> Self {
        Self {
            root_bean: None,
            root_type,
            groups: groups.to_vec(),
            visited: HashMap::new(),
            path: PropertyPath::root(),
            container: None,
        }
    }

    /// Returns the validated root bean, if the call has one.
    pub fn root_bean(&self) -> Option<&BeanRef> {
        self.root_bean.as_ref()
    }

    /// Returns the type of the validated root.
    pub fn root_type(&self) -> BeanType {
        self.root_type
    }

    /// Returns the requested groups. Empty means the default group.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns the path to the value currently being validated.
    pub fn current_path(&self) -> &PropertyPath {
        &self.path
    }

    /// Returns true if the bean with `id` has already been cascaded into.
    pub fn is_visited(&self, id: BeanId) -> bool {
        self.visited.contains_key(&id)
    }

    /// Returns true if `value` is a bean that has already been cascaded into.
    pub fn is_visited_value(&self, value: &Value) -> bool {
        value.identity().is_some_and(|id| self.is_visited(id))
    }

    /// Records a visit and keeps `bean` alive until the call ends. Returns
    /// false if the bean was already visited.
    pub(crate) fn mark_visited(&mut self, bean: &BeanRef) -> bool {
        match self.visited.entry(bean.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(bean.clone());
                true
            }
        }
    }

    /// Sets the container marker consumed by the next [`push_node`].
    ///
    /// [`push_node`]: ValidationContext::push_node
    pub(crate) fn enter_container(&mut self, element: ContainerElement) {
        self.container = Some(element);
    }

    /// Pushes a node named `name` and returns a scope that pops it on drop.
    ///
    /// If a container marker is pending, the node is a container element
    /// carrying the marker's position. The node inherits the in-iterable
    /// flag of its parent.
    pub(crate) fn push_node(&mut self, name: &str) -> PathScope<'_> {
        let parent_in_iterable = self.path.last().is_some_and(PathNode::is_in_iterable);
        let node = match self.container.take() {
            Some(element) => PathNode::container_element(name, element),
            None => PathNode::property(name),
        };
        self.path.push_in_place(node.within_iterable(parent_in_iterable));
        PathScope { context: self }
    }
}

/// A pushed path node. Dropping the scope pops it and clears any pending
/// container marker, on every exit path.
pub(crate) struct PathScope<'a> {
    context: &'a mut ValidationContext,
}

impl Deref for PathScope<'_> {
    type Target = ValidationContext;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for PathScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for PathScope<'_> {
    fn drop(&mut self) {
        self.context.path.pop_in_place();
        self.context.container = None;
    }
}

/// Where a cascade target was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// The value of a cascade property itself.
    Field,
    /// An element extracted from a container property.
    TypeUse,
}

/// Decides whether the validator may descend into a cascade target.
///
/// Both predicates are asked before every descent; if either answers false
/// the target is skipped without a violation.
pub trait TraversableResolver: Send + Sync {
    /// Returns true if `object` may be reached at `node`.
    fn is_reachable(
        &self,
        object: &Value,
        node: &PathNode,
        root_type: BeanType,
        path: &PropertyPath,
        element_type: ElementType,
    ) -> bool;

    /// Returns true if `object` may be cascaded into at `node`.
    fn is_cascadable(
        &self,
        object: &Value,
        node: &PathNode,
        root_type: BeanType,
        path: &PropertyPath,
        element_type: ElementType,
    ) -> bool;
}

/// A resolver that permits every descent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraverseAll;

impl TraversableResolver for TraverseAll {
    fn is_reachable(
        &self,
        _: &Value,
        _: &PathNode,
        _: BeanType,
        _: &PropertyPath,
        _: ElementType,
    ) -> bool {
        true
    }

    fn is_cascadable(
        &self,
        _: &Value,
        _: &PathNode,
        _: BeanType,
        _: &PropertyPath,
        _: ElementType,
    ) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Order;

    fn context() -> ValidationContext {
        ValidationContext::detached(BeanType::of::<Order>(), &[])
    }

    #[test]
    fn test_scope_pops_on_drop() {
        let mut context = context();
        {
            let mut scope = context.push_node("customer");
            assert_eq!(scope.current_path().to_string(), "customer");
            {
                let scope = scope.push_node("name");
                assert_eq!(scope.current_path().to_string(), "customer.name");
            }
            assert_eq!(scope.current_path().to_string(), "customer");
        }
        assert!(context.current_path().is_root());
    }

    #[test]
    fn test_scope_pops_on_early_return() {
        fn fails(context: &mut ValidationContext) -> Result<(), &'static str> {
            let _scope = context.push_node("items");
            Err("boom")
        }

        let mut context = context();
        assert!(fails(&mut context).is_err());
        assert!(context.current_path().is_root());
    }

    #[test]
    fn test_container_marker_applies_to_next_node_only() {
        let mut context = context();
        context.enter_container(ContainerElement::indexed(1));
        let mut element = context.push_node("items");
        assert_eq!(element.current_path().to_string(), "items[1]");

        let name = element.push_node("name");
        assert_eq!(name.current_path().to_string(), "items[1].name");
        assert!(name.current_path().last().is_some_and(PathNode::is_in_iterable));
    }

    #[test]
    fn test_marker_cleared_when_scope_drops() {
        let mut context = context();
        {
            let mut scope = context.push_node("prices");
            scope.enter_container(ContainerElement::keyed("eur"));
        }
        let scope = context.push_node("total");
        assert_eq!(scope.current_path().to_string(), "total");
    }

    #[test]
    fn test_root_is_visited() {
        let bean = BeanRef::new(Arc::new(Order));
        let mut context = ValidationContext::for_root(&bean, &[]);

        assert!(context.is_visited(bean.id()));
        assert!(context.root_bean().is_some());
        assert!(!context.mark_visited(&bean));

        let other = BeanRef::new(Arc::new(Order));
        assert!(!context.is_visited_value(&Value::Bean(other.clone())));
        assert!(context.mark_visited(&other));
        assert!(context.is_visited_value(&Value::Bean(other)));
    }

    #[test]
    fn test_visited_bean_outlives_its_getter() {
        let mut context = context();
        let order = Arc::new(Order);
        let weak = Arc::downgrade(&order);

        let bean = BeanRef::new(order);
        let id = bean.id();
        assert!(context.mark_visited(&bean));
        drop(bean);

        assert!(weak.upgrade().is_some());
        assert!(context.is_visited(id));
    }

    #[test]
    fn test_detached_context_has_no_root() {
        let context = context();
        assert!(context.root_bean().is_none());
        assert_eq!(context.root_type(), BeanType::of::<Order>());
        assert!(context.groups().is_empty());
    }
}
