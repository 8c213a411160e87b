//! Dynamic values and type tags for object graph traversal.
//!
//! This module provides [`Value`], the dynamic representation of everything a
//! bean property can return, together with [`BeanRef`] handles for nested beans
//! and the [`TypeTag`]s both registries dispatch on.

use std::any::{Any, TypeId};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

/// The Rust type of a bean, used to look up its introspection.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// error messages and display.
#[derive(Debug, Clone, Copy)]
pub struct BeanType {
    id: TypeId,
    name: &'static str,
}

impl BeanType {
    /// Returns the bean type for `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the bean type.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path.
    pub fn simple_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for BeanType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BeanType {}

impl Hash for BeanType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Identity of a bean instance: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeanId(usize);

/// A shared, type-erased handle to a bean instance.
///
/// Two handles are equal only when they point at the same allocation, which
/// is the identity the cycle guard tracks.
#[derive(Clone)]
pub struct BeanRef {
    bean_type: BeanType,
    inner: Arc<dyn Any + Send + Sync>,
}

impl BeanRef {
    /// Wraps a shared bean instance.
    pub fn new<T: Any + Send + Sync>(bean: Arc<T>) -> Self {
        Self {
            bean_type: BeanType::of::<T>(),
            inner: bean,
        }
    }

    /// Returns the runtime type of the bean.
    pub fn bean_type(&self) -> BeanType {
        self.bean_type
    }

    /// Returns the identity of this instance.
    pub fn id(&self) -> BeanId {
        BeanId(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    /// Returns the instance as `&dyn Any` for downcasting.
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner
    }

    /// Downcasts to the concrete bean type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns true if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &BeanRef) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for BeanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.bean_type.simple_name(), self.id().0)
    }
}

impl PartialEq for BeanRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for BeanRef {}

impl Hash for BeanRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

/// The runtime type tag of a value.
///
/// Constraint validators and value extractors are registered against tags.
/// [`TypeTag::Any`] is the fallback registration that matches every type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Any,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Set,
    Map,
    Optional,
    Bean(BeanType),
}

impl TypeTag {
    /// Returns the tag for beans of type `T`.
    pub fn bean<T: Any>() -> Self {
        TypeTag::Bean(BeanType::of::<T>())
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Any => write!(f, "any"),
            TypeTag::Bool => write!(f, "boolean"),
            TypeTag::Int => write!(f, "integer"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Str => write!(f, "string"),
            TypeTag::Bytes => write!(f, "bytes"),
            TypeTag::List => write!(f, "list"),
            TypeTag::Set => write!(f, "set"),
            TypeTag::Map => write!(f, "map"),
            TypeTag::Optional => write!(f, "optional"),
            TypeTag::Bean(bean_type) => write!(f, "{}", bean_type.simple_name()),
        }
    }
}

/// A dynamic value read from a bean property.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Ordered container whose elements are addressed by position.
    List(Vec<Value>),
    /// Iterable container without positions.
    Set(Vec<Value>),
    /// Keyed container, insertion ordered.
    Map(IndexMap<String, Value>),
    /// A wrapper that may be empty.
    Optional(Option<Box<Value>>),
    Bean(BeanRef),
}

impl Value {
    /// Wraps a shared bean instance.
    pub fn bean<T: Any + Send + Sync>(bean: Arc<T>) -> Self {
        Value::Bean(BeanRef::new(bean))
    }

    /// Builds a list value.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set value.
    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a map value, keeping the iteration order of `entries`.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds an optional wrapper.
    pub fn optional<V: Into<Value>>(value: Option<V>) -> Self {
        Value::Optional(value.map(|v| Box::new(v.into())))
    }

    /// Maps `None` to [`Value::Null`].
    pub fn nullable<V: Into<Value>>(value: Option<V>) -> Self {
        value.map_or(Value::Null, Into::into)
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the runtime type tag, or `None` for null.
    pub fn runtime_type(&self) -> Option<TypeTag> {
        let tag = match self {
            Value::Null => return None,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::List(_) => TypeTag::List,
            Value::Set(_) => TypeTag::Set,
            Value::Map(_) => TypeTag::Map,
            Value::Optional(_) => TypeTag::Optional,
            Value::Bean(bean) => TypeTag::Bean(bean.bean_type()),
        };
        Some(tag)
    }

    /// Returns the bean handle if this value is a bean.
    pub fn as_bean(&self) -> Option<&BeanRef> {
        match self {
            Value::Bean(bean) => Some(bean),
            _ => None,
        }
    }

    /// Returns the identity of the value. Only beans have one.
    pub fn identity(&self) -> Option<BeanId> {
        self.as_bean().map(BeanRef::id)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns integers and floats as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the element count of strings (in chars), bytes and containers.
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(items) | Value::Set(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // Bitwise so that equality stays reflexive for NaN.
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a.iter().eq(b.iter()),
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Bean(a), Value::Bean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(n) => n.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::List(items) | Value::Set(items) => items.hash(state),
            Value::Map(entries) => {
                entries.len().hash(state);
                for (k, v) in entries {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Optional(inner) => inner.hash(state),
            Value::Bean(bean) => bean.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) | Value::Set(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Optional(Some(inner)) => write!(f, "Some({})", inner),
            Value::Optional(None) => write!(f, "None"),
            Value::Bean(bean) => write!(f, "{:?}", bean),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<BeanRef> for Value {
    fn from(bean: BeanRef) -> Self {
        Value::Bean(bean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Author;

    #[test]
    fn test_runtime_type() {
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(Value::from(3).runtime_type(), Some(TypeTag::Int));
        assert_eq!(Value::from("x").runtime_type(), Some(TypeTag::Str));
        assert_eq!(
            Value::optional(None::<i64>).runtime_type(),
            Some(TypeTag::Optional)
        );
        assert_eq!(
            Value::bean(Arc::new(Author)).runtime_type(),
            Some(TypeTag::bean::<Author>())
        );
    }

    #[test]
    fn test_bean_identity() {
        let shared = Arc::new(Author);
        let a = Value::bean(Arc::clone(&shared));
        let b = Value::bean(shared);
        let other = Value::bean(Arc::new(Author));

        assert_eq!(a, b);
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a, other);
        assert_ne!(a.identity(), other.identity());
        assert_eq!(Value::from("x").identity(), None);
    }

    #[test]
    fn test_float_equality_is_reflexive() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
    }

    #[test]
    fn test_map_equality_is_ordered() {
        let ab = Value::map([("a", 1), ("b", 2)]);
        let ba = Value::map([("b", 2), ("a", 1)]);
        assert_eq!(ab, ab.clone());
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_size() {
        assert_eq!(Value::from("héllo").size(), Some(5));
        assert_eq!(Value::list([1, 2, 3]).size(), Some(3));
        assert_eq!(Value::map([("k", true)]).size(), Some(1));
        assert_eq!(Value::from(1).size(), None);
    }

    #[test]
    fn test_bean_type_names() {
        let bean_type = BeanType::of::<Author>();
        assert_eq!(bean_type.simple_name(), "Author");
        assert!(bean_type.name().ends_with("::Author"));
    }

    #[test]
    fn test_nullable() {
        assert!(Value::nullable(None::<&str>).is_null());
        assert_eq!(Value::nullable(Some("a")), Value::from("a"));
    }
}
