//! # Converter Module
//!
//! String conversion strategies for bound parameters.
//!
//! A [`ParamConverter`] turns the raw text of a query parameter into a JSON value of the
//! declared shape, and turns such a value back into text. [`JsonParamConverter`] is the
//! generic implementation: it reads the text as a JSON document and coerces it into the
//! target's shape, except for string-accepting targets, where text passes through as-is.
//!
//! Converters are built once per binding site and shared by every request for that
//! route, so implementations must be immutable after construction.
//!
//! ## Example
//!
//! ```rust
//! use querybind::converter::{JsonParamConverter, ParamConverter};
//! use querybind::types::{TargetType, TypeDescriptor};
//! use serde_json::json;
//!
//! let target = TargetType::of(TypeDescriptor::sorted_set(TypeDescriptor::Integer));
//! let converter = JsonParamConverter::new(target);
//! assert_eq!(converter.parse("[9,7,8]").unwrap(), json!([7, 8, 9]));
//! assert_eq!(converter.format(&json!([1, 2])).unwrap(), "[1,2]");
//! ```

use crate::shape::{self, ShapeError};
use crate::types::{TargetType, TypeDescriptor};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Failure converting between parameter text and a typed value.
///
/// Conversion is deterministic, so none of these are worth retrying; the binding
/// layer reports them to the client as a bad request.
#[derive(Debug)]
pub enum ConversionError {
    /// The text is not a JSON document
    Syntax {
        target: TargetType,
        source: serde_json::Error,
    },
    /// The JSON document does not fit the target shape
    Shape {
        target: TargetType,
        source: ShapeError,
    },
    /// A value could not be serialized
    Serialize {
        target: TargetType,
        source: serde_json::Error,
    },
    /// A normalized value could not be read into the requested Rust type
    Typed {
        target: TargetType,
        source: serde_json::Error,
    },
}

impl ConversionError {
    #[must_use]
    pub fn target(&self) -> &TargetType {
        match self {
            ConversionError::Syntax { target, .. }
            | ConversionError::Shape { target, .. }
            | ConversionError::Serialize { target, .. }
            | ConversionError::Typed { target, .. } => target,
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Syntax { target, source } => {
                write!(f, "cannot parse {target} from JSON: {source}")
            }
            ConversionError::Shape { target, source } => {
                write!(f, "value does not match {target}: {source}")
            }
            ConversionError::Serialize { target, source } => {
                write!(f, "cannot serialize {target}: {source}")
            }
            ConversionError::Typed { target, source } => {
                write!(f, "cannot read {target} into the requested type: {source}")
            }
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::Syntax { source, .. }
            | ConversionError::Serialize { source, .. }
            | ConversionError::Typed { source, .. } => Some(source),
            ConversionError::Shape { source, .. } => Some(source),
        }
    }
}

/// A pair of functions mapping between parameter text and a typed value.
pub trait ParamConverter: Send + Sync + fmt::Debug {
    /// The target this converter was built for.
    fn target(&self) -> &TargetType;

    /// Convert parameter text into a value of the target shape.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the text cannot be converted.
    fn parse(&self, text: &str) -> Result<Value, ConversionError>;

    /// Convert a value of the target shape back into parameter text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the value does not fit the target or cannot
    /// be serialized.
    fn format(&self, value: &Value) -> Result<String, ConversionError>;
}

impl dyn ParamConverter {
    /// Parse `text` and read the normalized value into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] from [`ParamConverter::parse`], or
    /// [`ConversionError::Typed`] when `T` does not accept the normalized value.
    pub fn parse_as<T: DeserializeOwned>(&self, text: &str) -> Result<T, ConversionError> {
        let value = self.parse(text)?;
        serde_json::from_value(value).map_err(|source| ConversionError::Typed {
            target: self.target().clone(),
            source,
        })
    }

    /// Serialize `value` and format it as parameter text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `value` cannot be serialized or does not fit
    /// the target.
    pub fn format_from<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, ConversionError> {
        let value = serde_json::to_value(value).map_err(|source| ConversionError::Serialize {
            target: self.target().clone(),
            source,
        })?;
        self.format(&value)
    }
}

/// Generic JSON-backed converter.
///
/// Holds the target and the shape derived from it; `serde_json` itself is stateless,
/// so a single instance is safe to share across concurrent requests.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonParamConverter {
    target: TargetType,
    shape: TypeDescriptor,
}

impl JsonParamConverter {
    #[must_use]
    pub fn new(target: TargetType) -> Self {
        let shape = target.shape();
        Self { target, shape }
    }

    /// Shape values are coerced into.
    #[must_use]
    pub fn shape(&self) -> &TypeDescriptor {
        &self.shape
    }

    fn passes_through(&self) -> bool {
        self.target.raw_type().accepts_string()
    }

    fn coerce(&self, value: Value) -> Result<Value, ConversionError> {
        shape::coerce(value, &self.shape).map_err(|source| ConversionError::Shape {
            target: self.target.clone(),
            source,
        })
    }
}

impl ParamConverter for JsonParamConverter {
    fn target(&self) -> &TargetType {
        &self.target
    }

    fn parse(&self, text: &str) -> Result<Value, ConversionError> {
        if self.passes_through() {
            return Ok(Value::String(text.to_owned()));
        }
        let value: Value =
            serde_json::from_str(text).map_err(|source| ConversionError::Syntax {
                target: self.target.clone(),
                source,
            })?;
        self.coerce(value)
    }

    fn format(&self, value: &Value) -> Result<String, ConversionError> {
        let normalized = self.coerce(value.clone())?;
        if self.passes_through() {
            // Scalars render as bare text for string targets, like `parse` reads them
            if let Value::String(text) = normalized {
                return Ok(text);
            }
        }
        serde_json::to_string(&normalized).map_err(|source| ConversionError::Serialize {
            target: self.target.clone(),
            source,
        })
    }
}
