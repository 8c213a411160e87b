//! Tests for cascaded validation into nested beans and containers.

use std::sync::Arc;
use verity::{
    BeanIntrospection, Constraint, ConstraintKind, DefaultValidator, ElementKind,
    IntrospectionRegistry, TypeTag, Value,
};

struct Item {
    name: String,
    quantity: i64,
}

struct Price {
    amount: i64,
}

struct Tag {
    label: String,
}

struct Address {
    city: String,
}

struct Customer {
    address: Option<Arc<Address>>,
}

#[derive(Default)]
struct Order {
    customer: Option<Arc<Customer>>,
    items: Vec<Arc<Item>>,
    prices: Vec<(String, Arc<Price>)>,
    tags: Vec<Arc<Tag>>,
    labels: Vec<String>,
    gift: Option<Arc<Item>>,
}

fn item(name: &str, quantity: i64) -> Arc<Item> {
    Arc::new(Item {
        name: name.to_string(),
        quantity,
    })
}

fn validator() -> DefaultValidator {
    let registry = IntrospectionRegistry::new();

    registry
        .register(
            BeanIntrospection::builder::<Item>()
                .property("name", TypeTag::Str, |i| Value::from(i.name.as_str()))
                .constraint(Constraint::not_blank())
                .property("quantity", TypeTag::Int, |i| Value::from(i.quantity))
                .constraint(Constraint::positive())
                .build(),
        )
        .unwrap();

    registry
        .register(
            BeanIntrospection::builder::<Price>()
                .property("amount", TypeTag::Int, |p| Value::from(p.amount))
                .constraint(Constraint::positive_or_zero())
                .build(),
        )
        .unwrap();

    registry
        .register(
            BeanIntrospection::builder::<Tag>()
                .property("label", TypeTag::Str, |t| Value::from(t.label.as_str()))
                .constraint(Constraint::size(2, 8))
                .build(),
        )
        .unwrap();

    registry
        .register(
            BeanIntrospection::builder::<Address>()
                .property("city", TypeTag::Str, |a| Value::from(a.city.as_str()))
                .constraint(Constraint::not_blank())
                .build(),
        )
        .unwrap();

    registry
        .register(
            BeanIntrospection::builder::<Customer>()
                .property("address", TypeTag::bean::<Address>(), |c| {
                    Value::nullable(c.address.clone().map(Value::bean))
                })
                .cascade()
                .build(),
        )
        .unwrap();

    registry
        .register(
            BeanIntrospection::builder::<Order>()
                .property("customer", TypeTag::bean::<Customer>(), |o| {
                    Value::nullable(o.customer.clone().map(Value::bean))
                })
                .cascade()
                .property("items", TypeTag::List, |o| {
                    Value::List(o.items.iter().cloned().map(Value::bean).collect())
                })
                .cascade()
                .property("prices", TypeTag::Map, |o| {
                    Value::map(
                        o.prices
                            .iter()
                            .map(|(k, p)| (k.clone(), Value::bean(Arc::clone(p)))),
                    )
                })
                .cascade()
                .property("tags", TypeTag::Set, |o| {
                    Value::Set(o.tags.iter().cloned().map(Value::bean).collect())
                })
                .cascade()
                .property("labels", TypeTag::List, |o| {
                    Value::list(o.labels.iter().map(String::as_str))
                })
                .cascade()
                .constraint(Constraint::not_blank())
                .property("gift", TypeTag::Optional, |o| {
                    Value::Optional(o.gift.clone().map(|g| Box::new(Value::bean(g))))
                })
                .cascade()
                .build(),
        )
        .unwrap();

    DefaultValidator::new(registry)
}

#[test]
fn test_list_element_path_renders_index() {
    let order = Order {
        items: vec![item("pen", 1), item("", 2)],
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();

    assert_eq!(violations.len(), 1);
    let violation = violations.iter().next().unwrap();
    assert_eq!(violation.property_path().to_string(), "items[1].name");
    assert_eq!(violation.constraint_kind(), &ConstraintKind::NOT_BLANK);
    assert_eq!(violation.invalid_value(), &Value::from(""));
}

#[test]
fn test_leaf_bean_is_the_element() {
    let failing = item("ok", -3);
    let order = Arc::new(Order {
        items: vec![Arc::clone(&failing)],
        ..Order::default()
    });
    let root = Value::bean(Arc::clone(&order));

    let violations = validator().validate(&root, &[]).unwrap();
    let violation = violations.iter().next().unwrap();

    assert_eq!(violation.property_path().to_string(), "items[0].quantity");
    assert_eq!(violation.root_bean(), Some(&root));
    assert!(violation
        .leaf_bean()
        .and_then(Value::as_bean)
        .and_then(|b| b.downcast_ref::<Item>())
        .is_some_and(|i| std::ptr::eq(i, &*failing)));
}

#[test]
fn test_element_node_kind_and_position() {
    let order = Order {
        items: vec![item("", 1)],
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    let path = violations.iter().next().unwrap().property_path().clone();
    let nodes: Vec<_> = path.nodes().collect();

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].kind(), ElementKind::ContainerElement);
    assert_eq!(nodes[0].name(), "items");
    assert_eq!(nodes[0].index(), Some(0));
    assert!(nodes[0].is_in_iterable());
    assert_eq!(nodes[1].kind(), ElementKind::Property);
    assert!(nodes[1].is_in_iterable());
}

#[test]
fn test_map_element_path_renders_key() {
    let order = Order {
        prices: vec![
            ("usd".to_string(), Arc::new(Price { amount: 10 })),
            ("eur".to_string(), Arc::new(Price { amount: -1 })),
        ],
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    assert_eq!(violations.paths(), vec!["prices[eur].amount"]);

    let path = violations.iter().next().unwrap().property_path().clone();
    assert_eq!(path.nodes().next().and_then(|n| n.key()), Some("eur"));
}

#[test]
fn test_set_element_path_has_no_position() {
    let order = Order {
        tags: vec![
            Arc::new(Tag { label: "ok".into() }),
            Arc::new(Tag { label: "x".into() }),
        ],
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    assert_eq!(violations.paths(), vec!["tags[].label"]);
}

#[test]
fn test_nested_bean_path() {
    let order = Order {
        customer: Some(Arc::new(Customer {
            address: Some(Arc::new(Address { city: " ".into() })),
        })),
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    assert_eq!(violations.paths(), vec!["customer.address.city"]);
}

#[test]
fn test_null_cascade_targets_are_skipped() {
    let order = Order {
        customer: Some(Arc::new(Customer { address: None })),
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    assert!(violations.is_empty());
}

#[test]
fn test_plain_elements_get_cascade_property_constraints() {
    let order = Order {
        labels: vec!["fragile".into(), "  ".into()],
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();

    // the list itself is not blank-checked, each string element is
    assert_eq!(violations.paths(), vec!["labels[1]"]);
    assert_eq!(violations.iter().next().unwrap().invalid_value(), &Value::from("  "));
}

#[test]
fn test_optional_bean_is_cascaded() {
    let order = Order {
        gift: Some(item("", 1)),
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    assert_eq!(violations.paths(), vec!["gift.name"]);
}

#[test]
fn test_same_instance_in_list_is_validated_once() {
    let shared = item("", 1);
    let order = Order {
        items: vec![Arc::clone(&shared), Arc::clone(&shared)],
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    assert_eq!(violations.paths(), vec!["items[0].name"]);
}

#[test]
fn test_violations_across_containers_in_traversal_order() {
    let order = Order {
        items: vec![item("", 0)],
        prices: vec![("gbp".to_string(), Arc::new(Price { amount: -5 }))],
        ..Order::default()
    };

    let violations = validator().validate(&Value::bean(Arc::new(order)), &[]).unwrap();
    assert_eq!(
        violations.paths(),
        vec!["items[0].name", "items[0].quantity", "prices[gbp].amount"]
    );
}
