//! # Converter Registry
//!
//! Decides, per binding site, whether a custom converter applies.
//!
//! A [`ConverterRegistry`] holds an ordered list of [`ConverterProvider`]s. When a route
//! is registered, each binding site's [`TargetType`] and [`Annotation`]s are offered to
//! the providers in order; the first converter returned is attached to the binding and
//! reused for every request. When no provider claims a target, the binding layer
//! falls back to its default conversion (see [`crate::binding`]).
//!
//! ## Selection rule of the JSON provider
//!
//! [`JsonConverterProvider`] claims:
//!
//! - every map, set and sorted-set target, and
//! - list targets whose element descriptor is one of its registered list elements.
//!
//! Anything else, including `list<string>`, is left to default binding, so repeated
//! `?param=a&param=b` values keep binding as a plain list.
//!
//! ```rust
//! use querybind::registry::{ConverterRegistry, JsonConverterProvider};
//! use querybind::types::{RecordType, TargetType, TypeDescriptor};
//! use std::sync::Arc;
//!
//! let pojo = TypeDescriptor::Record(RecordType::new("Pojo", [("field", TypeDescriptor::Integer)]));
//! let mut registry = ConverterRegistry::new();
//! registry.register(Arc::new(JsonConverterProvider::new().with_list_element(pojo.clone())));
//!
//! assert!(registry.resolve(&TargetType::of(TypeDescriptor::list(pojo)), &[]).is_some());
//! assert!(registry.resolve(&TargetType::of(TypeDescriptor::list(TypeDescriptor::String)), &[]).is_none());
//! ```

use crate::converter::{JsonParamConverter, ParamConverter};
use crate::types::{RawType, TargetType, TypeDescriptor};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Metadata attached to a binding site (`query("param")`, `default("1")`, ...).
///
/// Providers receive them alongside the target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub value: Option<String>,
}

impl Annotation {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Source of custom converters.
///
/// Implementations must be pure: the same target and annotations always yield an
/// equivalent answer.
pub trait ConverterProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Return a converter for `target`, or `None` to let the next provider (or default
    /// binding) handle it.
    fn converter(
        &self,
        target: &TargetType,
        annotations: &[Annotation],
    ) -> Option<Arc<dyn ParamConverter>>;
}

/// Provider handing out [`JsonParamConverter`]s for maps, sets, sorted sets and
/// lists of selected element types.
#[derive(Debug, Clone, Default)]
pub struct JsonConverterProvider {
    list_elements: Vec<TypeDescriptor>,
}

impl JsonConverterProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also claim `list<element>` targets.
    #[must_use]
    pub fn with_list_element(mut self, element: TypeDescriptor) -> Self {
        if !self.list_elements.contains(&element) {
            self.list_elements.push(element);
        }
        self
    }

    /// Whether this provider claims `target`.
    #[must_use]
    pub fn applies_to(&self, target: &TargetType) -> bool {
        match target.raw_type() {
            RawType::Map | RawType::Set | RawType::SortedSet => true,
            RawType::List => target
                .element_type()
                .is_some_and(|element| self.list_elements.contains(element)),
            _ => false,
        }
    }
}

impl ConverterProvider for JsonConverterProvider {
    fn name(&self) -> &str {
        "json"
    }

    fn converter(
        &self,
        target: &TargetType,
        _annotations: &[Annotation],
    ) -> Option<Arc<dyn ParamConverter>> {
        if self.applies_to(target) {
            Some(Arc::new(JsonParamConverter::new(target.clone())))
        } else {
            None
        }
    }
}

type Predicate = dyn Fn(&TargetType, &[Annotation]) -> bool + Send + Sync;
type Constructor = dyn Fn(&TargetType) -> Arc<dyn ParamConverter> + Send + Sync;

/// Provider assembled from a predicate and a constructor closure.
pub struct FnProvider {
    name: String,
    predicate: Box<Predicate>,
    build: Box<Constructor>,
}

impl FnProvider {
    pub fn new<P, B>(name: impl Into<String>, predicate: P, build: B) -> Self
    where
        P: Fn(&TargetType, &[Annotation]) -> bool + Send + Sync + 'static,
        B: Fn(&TargetType) -> Arc<dyn ParamConverter> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            build: Box::new(build),
        }
    }
}

impl ConverterProvider for FnProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn converter(
        &self,
        target: &TargetType,
        annotations: &[Annotation],
    ) -> Option<Arc<dyn ParamConverter>> {
        if (self.predicate)(target, annotations) {
            Some((self.build)(target))
        } else {
            None
        }
    }
}

/// Ordered set of converter providers; the first match wins.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    providers: Vec<Arc<dyn ConverterProvider>>,
}

impl ConverterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn ConverterProvider>) {
        debug!(provider = provider.name(), "Converter provider registered");
        self.providers.push(provider);
    }

    /// Register a provider built from a predicate and a constructor.
    pub fn register_fn<P, B>(&mut self, name: &str, predicate: P, build: B)
    where
        P: Fn(&TargetType, &[Annotation]) -> bool + Send + Sync + 'static,
        B: Fn(&TargetType) -> Arc<dyn ParamConverter> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnProvider::new(name, predicate, build)));
    }

    /// Find the converter for a binding site, if any provider claims it.
    ///
    /// `None` means default binding applies.
    #[must_use]
    pub fn resolve(
        &self,
        target: &TargetType,
        annotations: &[Annotation],
    ) -> Option<Arc<dyn ParamConverter>> {
        for provider in &self.providers {
            if let Some(converter) = provider.converter(target, annotations) {
                debug!(
                    provider = provider.name(),
                    target = %target,
                    "Converter resolved"
                );
                return Some(converter);
            }
        }
        debug!(target = %target, "No converter claimed target, default binding applies");
        None
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordType;

    fn pojo() -> TypeDescriptor {
        TypeDescriptor::Record(RecordType::new("Pojo", [("field", TypeDescriptor::Integer)]))
    }

    #[test]
    fn test_json_provider_selection() {
        let provider = JsonConverterProvider::new().with_list_element(pojo());
        let int = || TypeDescriptor::Integer;

        assert!(provider.applies_to(&TargetType::of(TypeDescriptor::map(TypeDescriptor::String, int()))));
        assert!(provider.applies_to(&TargetType::of(TypeDescriptor::set(int()))));
        assert!(provider.applies_to(&TargetType::of(TypeDescriptor::sorted_set(int()))));
        assert!(provider.applies_to(&TargetType::erased(RawType::Map)));
        assert!(provider.applies_to(&TargetType::of(TypeDescriptor::list(pojo()))));

        assert!(!provider.applies_to(&TargetType::of(TypeDescriptor::list(TypeDescriptor::String))));
        assert!(!provider.applies_to(&TargetType::erased(RawType::List)));
        assert!(!provider.applies_to(&TargetType::of(TypeDescriptor::list(TypeDescriptor::list(pojo())))));
        assert!(!provider.applies_to(&TargetType::of(TypeDescriptor::String)));
        assert!(!provider.applies_to(&TargetType::of(pojo())));
    }

    #[test]
    fn test_first_provider_wins() {
        let mut registry = ConverterRegistry::new();
        registry.register_fn(
            "strings",
            |target, _| target.raw_type() == &RawType::String,
            |target| Arc::new(JsonParamConverter::new(target.clone())),
        );
        registry.register(Arc::new(JsonConverterProvider::new()));
        assert_eq!(registry.len(), 2);

        let string = TargetType::of(TypeDescriptor::String);
        let converter = registry.resolve(&string, &[]).unwrap();
        assert_eq!(converter.target(), &string);

        assert!(registry
            .resolve(&TargetType::of(TypeDescriptor::Integer), &[])
            .is_none());
    }

    #[test]
    fn test_fn_provider_sees_annotations() {
        let mut registry = ConverterRegistry::new();
        registry.register_fn(
            "annotated",
            |_, annotations| annotations.iter().any(|a| a.name == "json"),
            |target| Arc::new(JsonParamConverter::new(target.clone())),
        );
        let target = TargetType::of(TypeDescriptor::Integer);
        assert!(registry.resolve(&target, &[]).is_none());
        assert!(registry
            .resolve(&target, &[Annotation::new("json")])
            .is_some());
    }

    #[test]
    fn test_debug_lists_provider_names() {
        let mut registry = ConverterRegistry::new();
        registry.register(Arc::new(JsonConverterProvider::new()));
        assert_eq!(format!("{registry:?}"), "[\"json\"]");
    }
}
