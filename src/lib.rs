//! # querybind
//!
//! **querybind** binds structured query-parameter values, written as JSON text, to typed
//! handler arguments. A request such as `GET /hello/map?param={"k":"1"}` reaches its
//! handler with an already converted `map<string, integer>`.
//!
//! ## Overview
//!
//! Conversion is driven by a [`ConverterRegistry`](registry::ConverterRegistry): each
//! handler parameter is described by a [`TargetType`](types::TargetType) and, when a route
//! is registered, the registry asks its providers in order for a
//! [`ParamConverter`](converter::ParamConverter). Parameters that no provider claims fall
//! back to default binding (plain strings, numbers, and collections of them).
//!
//! ## Architecture
//!
//! - **[`types`]** - Type descriptors for parameter targets, including generic arguments
//! - **[`shape`]** - Normalizing parsed JSON against a descriptor
//! - **[`converter`]** - The converter trait and the generic JSON converter
//! - **[`registry`]** - Converter providers and the registry that queries them
//! - **[`binding`]** - Resolving parameter bindings and binding query values
//! - **[`query`]** - Query-string parsing
//! - **[`router`]** - Route table keyed by method and path
//! - **[`server`]** - HTTP server built on `may_minihttp`
//! - **[`hello`]** - The example resource with map/set/sortedset/pojolist/stringlist endpoints
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - Process setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Service as server::AppService
//!     participant Router as router::Router
//!     participant Param as binding::BoundParam
//!     participant Conv as converter::JsonParamConverter
//!     participant Handler
//!
//!     Client->>Service: GET /hello/set?param=[3,4,5]
//!     Service->>Router: route(GET, /hello/set)
//!     Router-->>Service: Route
//!     Service->>Param: bind(query)
//!     Param->>Conv: parse("[3,4,5]")
//!     Conv-->>Param: [3,4,5]
//!     Param-->>Service: BoundArgs
//!     Service->>Handler: handler(args)
//!     Handler-->>Service: "3-4-5"
//!     Service-->>Client: 200 text/plain
//! ```
//!
//! ## Example
//!
//! ```rust
//! use querybind::registry::{ConverterRegistry, JsonConverterProvider};
//! use querybind::types::{TargetType, TypeDescriptor};
//! use std::sync::Arc;
//!
//! let mut registry = ConverterRegistry::new();
//! registry.register(Arc::new(JsonConverterProvider::new()));
//!
//! let target = TargetType::of(TypeDescriptor::sorted_set(TypeDescriptor::Integer));
//! let converter = registry.resolve(&target, &[]).unwrap();
//! let values: Vec<i64> = converter.parse_as("[9, 7, 8, 7]").unwrap();
//! assert_eq!(values, vec![7, 8, 9]);
//! ```

pub mod binding;
pub mod cli;
pub mod config;
pub mod converter;
pub mod hello;
pub mod ids;
pub mod logging;
pub mod query;
pub mod registry;
pub mod router;
pub mod server;
pub mod shape;
pub mod types;

pub use binding::{BindError, BoundArgs, BoundParam, ParamBinding};
pub use converter::{ConversionError, JsonParamConverter, ParamConverter};
pub use query::QueryParams;
pub use registry::{Annotation, ConverterProvider, ConverterRegistry, JsonConverterProvider};
pub use router::{HandlerResponse, Route, RouteError, Router};
pub use types::{RawType, TargetType, TypeDescriptor};
