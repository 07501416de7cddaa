use crate::binding::{bind_all, BindError, BoundArgs, BoundParam, ParamBinding};
use crate::query::QueryParams;
use crate::registry::ConverterRegistry;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Handler body: bound arguments in, response out.
pub type HandlerFn = dyn Fn(&BoundArgs) -> Result<HandlerResponse, BindError> + Send + Sync;

/// Response produced by a handler.
///
/// A string body is written as `text/plain`, anything else as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    /// `200 OK` with a `text/plain` body.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: Value::String(body.into()),
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// A registered route.
pub struct Route {
    pub method: Method,
    pub path: String,
    pub handler_name: String,
    params: Vec<BoundParam>,
    handler: Arc<HandlerFn>,
}

impl Route {
    #[must_use]
    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    /// Bind the route's parameters from `query` and run the handler.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindError`] raised while binding, or one raised by the
    /// handler while reading its arguments.
    pub fn invoke(&self, query: &QueryParams) -> Result<HandlerResponse, BindError> {
        let args = bind_all(&self.params, query)?;
        (self.handler)(&args)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handler_name", &self.handler_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Route registration failure.
#[derive(Debug)]
pub enum RouteError {
    /// The method and path are already registered
    Duplicate { method: Method, path: String },
    /// A parameter binding could not be resolved
    Binding {
        handler_name: String,
        source: BindError,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Duplicate { method, path } => {
                write!(f, "route {method} {path} is already registered")
            }
            RouteError::Binding {
                handler_name,
                source,
            } => write!(f, "cannot register handler '{handler_name}': {source}"),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Binding { source, .. } => Some(source),
            RouteError::Duplicate { .. } => None,
        }
    }
}

/// Exact-match routing table.
///
/// Paths are compared after trimming a trailing `/` (except for the root).
#[derive(Debug, Default)]
pub struct Router {
    registry: ConverterRegistry,
    routes: HashMap<String, HashMap<Method, Arc<Route>>>,
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

impl Router {
    /// Create an empty router resolving converters through `registry`.
    #[must_use]
    pub fn new(registry: ConverterRegistry) -> Self {
        Self {
            registry,
            routes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Register a handler, resolving a converter for each of its bindings.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Duplicate`] if the route exists, or
    /// [`RouteError::Binding`] if a binding has neither a converter nor a default
    /// binding.
    pub fn add_route<F>(
        &mut self,
        method: Method,
        path: &str,
        handler_name: &str,
        bindings: Vec<ParamBinding>,
        handler: F,
    ) -> Result<(), RouteError>
    where
        F: Fn(&BoundArgs) -> Result<HandlerResponse, BindError> + Send + Sync + 'static,
    {
        let path = normalize(path);
        if self
            .routes
            .get(path)
            .is_some_and(|methods| methods.contains_key(&method))
        {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }

        let params = bindings
            .into_iter()
            .map(|binding| BoundParam::resolve(binding, &self.registry))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| RouteError::Binding {
                handler_name: handler_name.to_string(),
                source,
            })?;

        let converters: Vec<&str> = params
            .iter()
            .map(|p| if p.converter().is_some() { "custom" } else { "default" })
            .collect();
        info!(
            method = %method,
            path = %path,
            handler = handler_name,
            params = ?params.iter().map(BoundParam::name).collect::<Vec<_>>(),
            converters = ?converters,
            "Route registered"
        );

        let route = Route {
            method: method.clone(),
            path: path.to_string(),
            handler_name: handler_name.to_string(),
            params,
            handler: Arc::new(handler),
        };
        self.routes
            .entry(path.to_string())
            .or_default()
            .insert(method, Arc::new(route));
        Ok(())
    }

    /// Look up the route for `method` and `path` (query string excluded).
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<Arc<Route>> {
        self.routes
            .get(normalize(path))
            .and_then(|methods| methods.get(method))
            .map(Arc::clone)
    }

    /// Whether any method is registered for `path`.
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.routes.contains_key(normalize(path))
    }

    /// All routes, sorted by path then method.
    #[must_use]
    pub fn routes(&self) -> Vec<Arc<Route>> {
        let mut routes: Vec<Arc<Route>> = self
            .routes
            .values()
            .flat_map(|methods| methods.values().map(Arc::clone))
            .collect();
        routes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
