//! # Router Module
//!
//! The router maps `(method, path)` pairs to registered routes. Each route carries the
//! parameter bindings of its handler, already resolved against the
//! [`ConverterRegistry`](crate::registry::ConverterRegistry) at registration time, so
//! per-request work is a lookup followed by binding and the handler call.
//!
//! ## Example
//!
//! ```rust
//! use querybind::binding::ParamBinding;
//! use querybind::registry::ConverterRegistry;
//! use querybind::router::{HandlerResponse, Router};
//! use querybind::types::{TargetType, TypeDescriptor};
//! use http::Method;
//!
//! let mut router = Router::new(ConverterRegistry::new());
//! router
//!     .add_route(
//!         Method::GET,
//!         "/echo",
//!         "echo",
//!         vec![ParamBinding::query("text", TargetType::of(TypeDescriptor::String))],
//!         |args| Ok(HandlerResponse::text(args.get_or_default::<String>("text")?)),
//!     )
//!     .unwrap();
//!
//! let route = router.route(&Method::GET, "/echo").unwrap();
//! assert_eq!(route.handler_name, "echo");
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{HandlerFn, HandlerResponse, Route, RouteError, Router};
