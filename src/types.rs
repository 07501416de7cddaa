//! # Type Descriptors
//!
//! Structured descriptions of the shape a query parameter binds to.
//!
//! A [`TypeDescriptor`] is the fully parameterized shape (`list<Pojo{field: integer}>`,
//! `map<string, integer>`), a [`RawType`] is its top-level kind with parameters erased,
//! and a [`TargetType`] pairs the two the way a binding site declares them: the raw type
//! is always known, the generic descriptor may be missing.
//!
//! Descriptors compare structurally. Two record descriptors are equal when their names
//! and declared fields are equal, so "is this a list of `Pojo`" is a plain `==` on the
//! element descriptor.
//!
//! ## Text syntax
//!
//! Descriptors parse from and render to a compact syntax used by the CLI:
//!
//! ```rust
//! use querybind::types::TypeDescriptor;
//!
//! let ty: TypeDescriptor = "map<string, list<Pojo{field: integer}>>".parse().unwrap();
//! assert_eq!(ty.to_string(), "map<string, list<Pojo{field: integer}>>");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A named field of a [`RecordType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    /// JSON property name
    pub name: String,
    /// Declared shape of the property value
    pub ty: TypeDescriptor,
}

/// A plain data record: a name plus an ordered list of typed fields.
///
/// Cheap to clone; name and fields are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    name: Arc<str>,
    fields: Arc<[RecordField]>,
}

impl RecordType {
    /// Build a record descriptor from a name and `(field, type)` pairs.
    pub fn new<N, I, S>(name: N, fields: I) -> Self
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        let fields: Vec<RecordField> = fields
            .into_iter()
            .map(|(name, ty)| RecordField {
                name: name.into(),
                ty,
            })
            .collect();
        Self {
            name: name.into(),
            fields: fields.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    /// Look up a declared field by its JSON name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Fully parameterized target shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    String,
    Integer,
    Number,
    Boolean,
    /// Any JSON value, left as parsed
    Any,
    Record(RecordType),
    List(Box<TypeDescriptor>),
    /// Unordered collection without duplicates; iteration keeps first-seen order
    Set(Box<TypeDescriptor>),
    /// Collection without duplicates kept in ascending order
    SortedSet(Box<TypeDescriptor>),
    /// Key descriptor, value descriptor
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
}

impl TypeDescriptor {
    #[must_use]
    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    #[must_use]
    pub fn set(element: TypeDescriptor) -> Self {
        TypeDescriptor::Set(Box::new(element))
    }

    #[must_use]
    pub fn sorted_set(element: TypeDescriptor) -> Self {
        TypeDescriptor::SortedSet(Box::new(element))
    }

    #[must_use]
    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(key), Box::new(value))
    }

    /// The top-level kind of this descriptor.
    #[must_use]
    pub fn raw(&self) -> RawType {
        match self {
            TypeDescriptor::String => RawType::String,
            TypeDescriptor::Integer => RawType::Integer,
            TypeDescriptor::Number => RawType::Number,
            TypeDescriptor::Boolean => RawType::Boolean,
            TypeDescriptor::Any => RawType::Any,
            TypeDescriptor::Record(record) => RawType::Record(record.clone()),
            TypeDescriptor::List(_) => RawType::List,
            TypeDescriptor::Set(_) => RawType::Set,
            TypeDescriptor::SortedSet(_) => RawType::SortedSet,
            TypeDescriptor::Map(_, _) => RawType::Map,
        }
    }

    /// Element type of a collection, or the value type of a map.
    #[must_use]
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::List(e) | TypeDescriptor::Set(e) | TypeDescriptor::SortedSet(e) => {
                Some(e)
            }
            TypeDescriptor::Map(_, v) => Some(v),
            _ => None,
        }
    }

    /// `true` for string, integer, number, boolean and any.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::String
                | TypeDescriptor::Integer
                | TypeDescriptor::Number
                | TypeDescriptor::Boolean
                | TypeDescriptor::Any
        )
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::String => f.write_str("string"),
            TypeDescriptor::Integer => f.write_str("integer"),
            TypeDescriptor::Number => f.write_str("number"),
            TypeDescriptor::Boolean => f.write_str("boolean"),
            TypeDescriptor::Any => f.write_str("any"),
            TypeDescriptor::Record(record) => {
                write!(f, "{}{{", record.name())?;
                for (i, field) in record.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                f.write_str("}")
            }
            TypeDescriptor::List(e) => write!(f, "list<{e}>"),
            TypeDescriptor::Set(e) => write!(f, "set<{e}>"),
            TypeDescriptor::SortedSet(e) => write!(f, "sortedset<{e}>"),
            TypeDescriptor::Map(k, v) => write!(f, "map<{k}, {v}>"),
        }
    }
}

/// Top-level kind of a target, generic parameters erased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawType {
    String,
    Integer,
    Number,
    Boolean,
    Any,
    Record(RecordType),
    List,
    Set,
    SortedSet,
    Map,
}

impl RawType {
    /// Whether a plain string is already a value of this type.
    ///
    /// Converters pass text through untouched for these targets.
    #[must_use]
    pub fn accepts_string(&self) -> bool {
        matches!(self, RawType::String | RawType::Any)
    }

    /// Descriptor for this raw type with every parameter set to [`TypeDescriptor::Any`].
    #[must_use]
    pub fn erased(&self) -> TypeDescriptor {
        match self {
            RawType::String => TypeDescriptor::String,
            RawType::Integer => TypeDescriptor::Integer,
            RawType::Number => TypeDescriptor::Number,
            RawType::Boolean => TypeDescriptor::Boolean,
            RawType::Any => TypeDescriptor::Any,
            RawType::Record(record) => TypeDescriptor::Record(record.clone()),
            RawType::List => TypeDescriptor::list(TypeDescriptor::Any),
            RawType::Set => TypeDescriptor::set(TypeDescriptor::Any),
            RawType::SortedSet => TypeDescriptor::sorted_set(TypeDescriptor::Any),
            RawType::Map => TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Any),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            RawType::String => "string",
            RawType::Integer => "integer",
            RawType::Number => "number",
            RawType::Boolean => "boolean",
            RawType::Any => "any",
            RawType::Record(record) => record.name(),
            RawType::List => "list",
            RawType::Set => "set",
            RawType::SortedSet => "sortedset",
            RawType::Map => "map",
        }
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a binding site converts into: a raw type plus, optionally, its full shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetType {
    raw: RawType,
    generic: Option<TypeDescriptor>,
}

impl TargetType {
    /// Target with full generic information.
    #[must_use]
    pub fn of(descriptor: TypeDescriptor) -> Self {
        Self {
            raw: descriptor.raw(),
            generic: Some(descriptor),
        }
    }

    /// Target known only by its raw type.
    #[must_use]
    pub fn erased(raw: RawType) -> Self {
        Self { raw, generic: None }
    }

    #[must_use]
    pub fn raw_type(&self) -> &RawType {
        &self.raw
    }

    #[must_use]
    pub fn generic_type(&self) -> Option<&TypeDescriptor> {
        self.generic.as_ref()
    }

    /// Element (or map value) descriptor, when generic information is present.
    #[must_use]
    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        self.generic.as_ref().and_then(TypeDescriptor::element)
    }

    /// Shape values are coerced into: the generic descriptor, or the erased raw type.
    #[must_use]
    pub fn shape(&self) -> TypeDescriptor {
        match &self.generic {
            Some(generic) => generic.clone(),
            None => self.raw.erased(),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.generic {
            Some(generic) => write!(f, "{generic}"),
            None => write!(f, "{}", self.raw),
        }
    }
}

/// Error returned when descriptor text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParseError {
    /// Byte offset into the input
    pub position: usize,
    pub message: String,
}

impl fmt::Display for TypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid type descriptor at offset {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TypeParseError {}

impl FromStr for TypeDescriptor {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = DescriptorParser { src: s, pos: 0 };
        let descriptor = parser.descriptor()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(descriptor)
    }
}

struct DescriptorParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn error(&self, message: impl Into<String>) -> TypeParseError {
        TypeParseError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            let valid = if self.pos == start {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if !valid {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.src[start..self.pos])
    }

    fn descriptor(&mut self) -> Result<TypeDescriptor, TypeParseError> {
        let name = self.ident()?;
        let descriptor = match name {
            "string" => TypeDescriptor::String,
            "integer" | "int" | "long" => TypeDescriptor::Integer,
            "number" | "float" | "double" => TypeDescriptor::Number,
            "boolean" | "bool" => TypeDescriptor::Boolean,
            "any" => TypeDescriptor::Any,
            "list" => TypeDescriptor::list(self.single_parameter()?),
            "set" => TypeDescriptor::set(self.single_parameter()?),
            "sortedset" | "sorted_set" => TypeDescriptor::sorted_set(self.single_parameter()?),
            "map" => {
                self.expect('<')?;
                let key = self.descriptor()?;
                self.expect(',')?;
                let value = self.descriptor()?;
                self.expect('>')?;
                TypeDescriptor::map(key, value)
            }
            record => {
                if !self.eat('{') {
                    return Err(self.error(format!("unknown type '{record}'")));
                }
                TypeDescriptor::Record(RecordType::new(record, self.record_fields()?))
            }
        };
        Ok(descriptor)
    }

    fn single_parameter(&mut self) -> Result<TypeDescriptor, TypeParseError> {
        self.expect('<')?;
        let inner = self.descriptor()?;
        self.expect('>')?;
        Ok(inner)
    }

    // Called after the opening brace has been consumed.
    fn record_fields(&mut self) -> Result<Vec<(String, TypeDescriptor)>, TypeParseError> {
        let mut fields = Vec::new();
        if self.eat('}') {
            return Ok(fields);
        }
        loop {
            let name = self.ident()?;
            if fields.iter().any(|(existing, _)| existing == name) {
                return Err(self.error(format!("duplicate field '{name}'")));
            }
            self.expect(':')?;
            let ty = self.descriptor()?;
            fields.push((name.to_string(), ty));
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            return Ok(fields);
        }
    }
}
