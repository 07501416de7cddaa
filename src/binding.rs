//! # Binding Module
//!
//! Turns query parameters into handler arguments.
//!
//! A [`ParamBinding`] declares a binding site: the query parameter name, the
//! [`TargetType`] it binds to, and its annotations. When a route is registered each
//! binding is resolved against the [`ConverterRegistry`] into a [`BoundParam`], which
//! either carries the custom converter that claimed it or falls back to default
//! binding:
//!
//! | Target                               | Default binding                      |
//! |--------------------------------------|--------------------------------------|
//! | string, integer, number, boolean, any | first value, coerced                 |
//! | list / set / sorted set of a scalar  | every value becomes one element      |
//! | map, record, collections of those    | none, rejected at registration       |
//!
//! A custom converter always receives the first value only.
//!
//! Absent parameters bind to nothing; handlers substitute their own empty value via
//! [`BoundArgs::get_or_default`].

use crate::converter::{ConversionError, ParamConverter};
use crate::query::QueryParams;
use crate::registry::{Annotation, ConverterRegistry};
use crate::shape;
use crate::types::{RawType, TargetType, TypeDescriptor};
use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Failure binding a request parameter.
#[derive(Debug)]
pub enum BindError {
    /// A required parameter was not supplied and has no default
    Missing { name: String },
    /// The parameter text could not be converted
    Conversion {
        name: String,
        source: ConversionError,
    },
    /// Neither a custom converter nor default binding can handle the target
    Unsupported { name: String, target: TargetType },
    /// A bound value was read into an incompatible Rust type
    Typed {
        name: String,
        source: serde_json::Error,
    },
}

impl BindError {
    /// Name of the parameter that failed to bind.
    #[must_use]
    pub fn parameter(&self) -> &str {
        match self {
            BindError::Missing { name }
            | BindError::Conversion { name, .. }
            | BindError::Unsupported { name, .. }
            | BindError::Typed { name, .. } => name,
        }
    }

    /// HTTP status the failure maps to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            BindError::Missing { .. } | BindError::Conversion { .. } | BindError::Typed { .. } => {
                400
            }
            BindError::Unsupported { .. } => 500,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::Missing { name } => write!(f, "missing required parameter '{name}'"),
            BindError::Conversion { name, source } => {
                write!(f, "invalid value for parameter '{name}': {source}")
            }
            BindError::Unsupported { name, target } => write!(
                f,
                "no converter registered for parameter '{name}' of type {target}"
            ),
            BindError::Typed { name, source } => {
                write!(f, "parameter '{name}' has an unexpected shape: {source}")
            }
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::Conversion { source, .. } => Some(source),
            BindError::Typed { source, .. } => Some(source),
            BindError::Missing { .. } | BindError::Unsupported { .. } => None,
        }
    }
}

/// Declaration of a query parameter a handler binds.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBinding {
    pub name: String,
    pub target: TargetType,
    pub annotations: Vec<Annotation>,
    /// Text used when the parameter is absent
    pub default_value: Option<String>,
    pub required: bool,
}

impl ParamBinding {
    /// Bind query parameter `name` to `target`.
    #[must_use]
    pub fn query(name: impl Into<String>, target: TargetType) -> Self {
        let name = name.into();
        Self {
            annotations: vec![Annotation::new("query").with_value(name.clone())],
            name,
            target,
            default_value: None,
            required: false,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.annotations
            .push(Annotation::new("default").with_value(value.clone()));
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Whether `target` can be bound without a custom converter.
#[must_use]
pub fn supports_default_binding(target: &TargetType) -> bool {
    match target.raw_type() {
        RawType::Map | RawType::Record(_) => false,
        RawType::List | RawType::Set | RawType::SortedSet => {
            target.element_type().map_or(true, TypeDescriptor::is_scalar)
        }
        RawType::String | RawType::Integer | RawType::Number | RawType::Boolean | RawType::Any => {
            true
        }
    }
}

/// A binding site with its converter resolved.
#[derive(Debug, Clone)]
pub struct BoundParam {
    binding: ParamBinding,
    shape: TypeDescriptor,
    converter: Option<Arc<dyn ParamConverter>>,
}

impl BoundParam {
    /// Resolve the converter for `binding`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Unsupported`] when no provider claims the target and the
    /// target has no default binding.
    pub fn resolve(binding: ParamBinding, registry: &ConverterRegistry) -> Result<Self, BindError> {
        let converter = registry.resolve(&binding.target, &binding.annotations);
        if converter.is_none() && !supports_default_binding(&binding.target) {
            return Err(BindError::Unsupported {
                name: binding.name,
                target: binding.target,
            });
        }
        let shape = binding.target.shape();
        Ok(Self {
            binding,
            shape,
            converter,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.binding.name
    }

    #[must_use]
    pub fn binding(&self) -> &ParamBinding {
        &self.binding
    }

    #[must_use]
    pub fn converter(&self) -> Option<&Arc<dyn ParamConverter>> {
        self.converter.as_ref()
    }

    /// Bind this parameter from `query`.
    ///
    /// Returns `Ok(None)` when the parameter is absent, optional and has no default.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Missing`] for an absent required parameter, or
    /// [`BindError::Conversion`] when the text cannot be converted.
    pub fn bind(&self, query: &QueryParams) -> Result<Option<Value>, BindError> {
        let name = self.binding.name.as_str();
        let mut values: SmallVec<[&str; 4]> = query.get_all(name).collect();
        if values.is_empty() {
            match (&self.binding.default_value, self.binding.required) {
                (Some(default), _) => values.push(default.as_str()),
                (None, true) => {
                    return Err(BindError::Missing {
                        name: name.to_string(),
                    })
                }
                (None, false) => return Ok(None),
            }
        }

        let converted = match &self.converter {
            Some(converter) => converter.parse(values[0]),
            None => self.default_bind(&values),
        };
        converted.map(Some).map_err(|source| {
            debug!(parameter = name, error = %source, "Parameter conversion failed");
            BindError::Conversion {
                name: name.to_string(),
                source,
            }
        })
    }

    fn default_bind(&self, values: &[&str]) -> Result<Value, ConversionError> {
        let raw = match self.shape {
            TypeDescriptor::List(_) | TypeDescriptor::Set(_) | TypeDescriptor::SortedSet(_) => {
                Value::Array(values.iter().map(|v| Value::String((*v).to_owned())).collect())
            }
            _ => Value::String(values[0].to_owned()),
        };
        shape::coerce(raw, &self.shape).map_err(|source| ConversionError::Shape {
            target: self.binding.target.clone(),
            source,
        })
    }
}

/// Parameters bound for one request, keyed by name. Absent parameters are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: HashMap<String, Value>,
}

impl BoundArgs {
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// The bound JSON value of `name`.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Read `name` into `T`; `None` when absent or null.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Typed`] when the bound value does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, BindError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|source| BindError::Typed {
                    name: name.to_string(),
                    source,
                }),
        }
    }

    /// Read `name` into `T`, substituting `T::default()` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Typed`] when the bound value does not fit `T`.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, BindError> {
        Ok(self.get(name)?.unwrap_or_default())
    }
}

/// Bind every parameter of a route.
///
/// # Errors
///
/// Stops at the first parameter that fails to bind.
pub fn bind_all(params: &[BoundParam], query: &QueryParams) -> Result<BoundArgs, BindError> {
    let mut args = BoundArgs::default();
    for param in params {
        if let Some(value) = param.bind(query)? {
            args.insert(param.name(), value);
        }
    }
    Ok(args)
}
