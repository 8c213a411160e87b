//! Value extractors: unwrapping containers into the values to validate.
//!
//! A cascade extractor walks the elements of a container property so each
//! one can be validated under its own path node. An unwrap extractor exposes
//! the value inside a wrapper so the property's constraints apply to it
//! instead of to the wrapper.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RegistryError, ValidationError};
use crate::path::ContainerElement;
use crate::value::{TypeTag, Value};

/// One value emitted by an extractor, with its position in the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractedValue<'a> {
    /// The single value held by a wrapper.
    Value(&'a Value),
    /// An element of a container without positions.
    Iterable(&'a Value),
    /// An element of an ordered container.
    Indexed(usize, &'a Value),
    /// An entry of a keyed container.
    Keyed(&'a str, &'a Value),
}

impl<'a> ExtractedValue<'a> {
    /// Returns the extracted value.
    pub fn value(&self) -> &'a Value {
        match *self {
            ExtractedValue::Value(v)
            | ExtractedValue::Iterable(v)
            | ExtractedValue::Indexed(_, v)
            | ExtractedValue::Keyed(_, v) => v,
        }
    }

    /// Returns the container marker for the element's path node.
    pub fn container_element(&self) -> ContainerElement {
        match *self {
            ExtractedValue::Value(_) => ContainerElement::single(),
            ExtractedValue::Iterable(_) => ContainerElement::iterable(),
            ExtractedValue::Indexed(index, _) => ContainerElement::indexed(index),
            ExtractedValue::Keyed(key, _) => ContainerElement::keyed(key),
        }
    }
}

/// Receives each extracted value. An error stops the extraction and is
/// returned from [`ValueExtractor::extract_values`].
pub type ValueReceiver<'r> = dyn FnMut(ExtractedValue<'_>) -> Result<(), ValidationError> + 'r;

/// Emits the values held by a container.
pub trait ValueExtractor: Send + Sync {
    /// Passes every value in `container` to `receiver`, in container order.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `receiver`.
    fn extract_values(
        &self,
        container: &Value,
        receiver: &mut ValueReceiver<'_>,
    ) -> Result<(), ValidationError>;
}

/// Emits list elements with their index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListExtractor;

impl ValueExtractor for ListExtractor {
    fn extract_values(
        &self,
        container: &Value,
        receiver: &mut ValueReceiver<'_>,
    ) -> Result<(), ValidationError> {
        if let Value::List(items) = container {
            for (i, item) in items.iter().enumerate() {
                receiver(ExtractedValue::Indexed(i, item))?;
            }
        }
        Ok(())
    }
}

/// Emits set elements without positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetExtractor;

impl ValueExtractor for SetExtractor {
    fn extract_values(
        &self,
        container: &Value,
        receiver: &mut ValueReceiver<'_>,
    ) -> Result<(), ValidationError> {
        if let Value::Set(items) = container {
            for item in items {
                receiver(ExtractedValue::Iterable(item))?;
            }
        }
        Ok(())
    }
}

/// Emits map values with their key.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapExtractor;

impl ValueExtractor for MapExtractor {
    fn extract_values(
        &self,
        container: &Value,
        receiver: &mut ValueReceiver<'_>,
    ) -> Result<(), ValidationError> {
        if let Value::Map(entries) = container {
            for (key, value) in entries {
                receiver(ExtractedValue::Keyed(key, value))?;
            }
        }
        Ok(())
    }
}

/// Emits the value of a present optional. An empty optional emits nothing.
///
/// Registered as a cascade extractor, it lets a cascade property typed as an
/// optional bean validate the present bean. The element renders without a
/// container marker, e.g. `gift.name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalExtractor;

impl ValueExtractor for OptionalExtractor {
    fn extract_values(
        &self,
        container: &Value,
        receiver: &mut ValueReceiver<'_>,
    ) -> Result<(), ValidationError> {
        if let Value::Optional(Some(inner)) = container {
            receiver(ExtractedValue::Value(inner))?;
        }
        Ok(())
    }
}

type ExtractorMap = Arc<RwLock<HashMap<TypeTag, Arc<dyn ValueExtractor>>>>;

/// A thread-safe table of cascade and unwrap extractors, keyed by the
/// runtime type of the container.
///
/// # Example
///
/// ```rust
/// use verity::{TypeTag, ValueExtractorRegistry};
///
/// let registry = ValueExtractorRegistry::with_defaults();
/// assert!(registry.find_value_extractor(&TypeTag::List).is_some());
/// assert!(registry.find_unwrap_value_extractor(&TypeTag::Optional).is_some());
/// assert!(registry.find_unwrap_value_extractor(&TypeTag::List).is_none());
/// ```
#[derive(Clone)]
pub struct ValueExtractorRegistry {
    cascade: ExtractorMap,
    unwrap: ExtractorMap,
}

impl ValueExtractorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            cascade: Arc::new(RwLock::new(HashMap::new())),
            unwrap: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a registry holding extractors for lists, sets, maps and
    /// optionals, plus the optional unwrap extractor.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        {
            let mut cascade = registry.cascade.write();
            cascade.insert(TypeTag::List, Arc::new(ListExtractor));
            cascade.insert(TypeTag::Set, Arc::new(SetExtractor));
            cascade.insert(TypeTag::Map, Arc::new(MapExtractor));
            // cascades into the present value instead of skipping optionals
            cascade.insert(TypeTag::Optional, Arc::new(OptionalExtractor));
        }
        registry.unwrap.write().insert(TypeTag::Optional, Arc::new(OptionalExtractor));
        registry
    }

    /// Registers a cascade extractor for containers of `type_tag`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateExtractor` if one is already registered.
    pub fn register_value_extractor<E>(
        &self,
        type_tag: TypeTag,
        extractor: E,
    ) -> Result<(), RegistryError>
    where
        E: ValueExtractor + 'static,
    {
        Self::register(&self.cascade, type_tag, Arc::new(extractor))
    }

    /// Registers an unwrap extractor for wrappers of `type_tag`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateExtractor` if one is already registered.
    pub fn register_unwrap_extractor<E>(
        &self,
        type_tag: TypeTag,
        extractor: E,
    ) -> Result<(), RegistryError>
    where
        E: ValueExtractor + 'static,
    {
        Self::register(&self.unwrap, type_tag, Arc::new(extractor))
    }

    /// Finds the cascade extractor for containers of `type_tag`.
    pub fn find_value_extractor(&self, type_tag: &TypeTag) -> Option<Arc<dyn ValueExtractor>> {
        self.cascade.read().get(type_tag).cloned()
    }

    /// Finds the unwrap extractor for wrappers of `type_tag`.
    pub fn find_unwrap_value_extractor(
        &self,
        type_tag: &TypeTag,
    ) -> Option<Arc<dyn ValueExtractor>> {
        self.unwrap.read().get(type_tag).cloned()
    }

    fn register(
        map: &ExtractorMap,
        type_tag: TypeTag,
        extractor: Arc<dyn ValueExtractor>,
    ) -> Result<(), RegistryError> {
        let mut extractors = map.write();
        if extractors.contains_key(&type_tag) {
            return Err(RegistryError::DuplicateExtractor(type_tag.to_string()));
        }
        extractors.insert(type_tag, extractor);
        Ok(())
    }
}

impl Default for ValueExtractorRegistry {
    /// Same as [`ValueExtractorRegistry::with_defaults`].
    fn default() -> Self {
        Self::with_defaults()
    }
}
