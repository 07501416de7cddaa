//! # Hello Resource
//!
//! Endpoints exercising JSON query-parameter conversion end to end:
//!
//! | Route                  | Parameter type       | Binding        | Body for `param` |
//! |------------------------|----------------------|----------------|------------------|
//! | `GET /hello/map`       | `map<string, integer>` | JSON converter | `k1:v1-k2:v2`    |
//! | `GET /hello/set`       | `set<integer>`       | JSON converter | `3-4-5`          |
//! | `GET /hello/sortedset` | `sortedset<integer>` | JSON converter | `7-8-9`          |
//! | `GET /hello/pojolist`  | `list<Pojo>`         | JSON converter | `2-4`            |
//! | `GET /hello/stringlist`| `list<string>`       | default        | `a-b-c`          |
//!
//! Every endpoint answers `""` when `param` is absent.

use crate::binding::{BindError, BoundArgs, ParamBinding};
use crate::registry::{ConverterRegistry, JsonConverterProvider};
use crate::router::{HandlerResponse, RouteError, Router};
use crate::types::{RecordType, TargetType, TypeDescriptor};
use http::Method;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

const PARAM: &str = "param";

/// Example payload record with a single integer field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pojo {
    pub field: Option<i64>,
}

/// Type descriptor of [`Pojo`]: `Pojo{field: integer}`.
#[must_use]
pub fn pojo_type() -> TypeDescriptor {
    TypeDescriptor::Record(RecordType::new("Pojo", [("field", TypeDescriptor::Integer)]))
}

/// Registry with the JSON provider claiming maps, sets, sorted sets and `list<Pojo>`.
#[must_use]
pub fn converter_registry() -> ConverterRegistry {
    let mut registry = ConverterRegistry::new();
    registry.register(Arc::new(
        JsonConverterProvider::new().with_list_element(pojo_type()),
    ));
    registry
}

/// Router with the hello resource registered on [`converter_registry`].
///
/// # Errors
///
/// Returns a [`RouteError`] if registration fails.
pub fn router() -> Result<Router, RouteError> {
    let mut router = Router::new(converter_registry());
    register(&mut router)?;
    Ok(router)
}

/// Register the `/hello/*` routes on `router`.
///
/// # Errors
///
/// Returns a [`RouteError`] if a route already exists or a binding cannot be resolved.
pub fn register(router: &mut Router) -> Result<(), RouteError> {
    let param = |ty: TypeDescriptor| vec![ParamBinding::query(PARAM, TargetType::of(ty))];

    router.add_route(
        Method::GET,
        "/hello/map",
        "map",
        param(TypeDescriptor::map(
            TypeDescriptor::String,
            TypeDescriptor::Integer,
        )),
        map,
    )?;
    router.add_route(
        Method::GET,
        "/hello/set",
        "set",
        param(TypeDescriptor::set(TypeDescriptor::Integer)),
        set,
    )?;
    router.add_route(
        Method::GET,
        "/hello/sortedset",
        "sorted_set",
        param(TypeDescriptor::sorted_set(TypeDescriptor::Integer)),
        sorted_set,
    )?;
    router.add_route(
        Method::GET,
        "/hello/pojolist",
        "pojo_list",
        param(TypeDescriptor::list(pojo_type())),
        pojo_list,
    )?;
    router.add_route(
        Method::GET,
        "/hello/stringlist",
        "string_list",
        param(TypeDescriptor::list(TypeDescriptor::String)),
        string_list,
    )?;
    Ok(())
}

fn join<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

fn or_null(value: Option<i64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}

fn map(args: &BoundArgs) -> Result<HandlerResponse, BindError> {
    let param: IndexMap<String, Option<i64>> = args.get_or_default(PARAM)?;
    Ok(HandlerResponse::text(join(
        param.iter().map(|(k, v)| format!("{k}:{}", or_null(*v))),
    )))
}

fn set(args: &BoundArgs) -> Result<HandlerResponse, BindError> {
    let param: IndexSet<i64> = args.get_or_default(PARAM)?;
    Ok(HandlerResponse::text(join(param)))
}

fn sorted_set(args: &BoundArgs) -> Result<HandlerResponse, BindError> {
    let param: BTreeSet<i64> = args.get_or_default(PARAM)?;
    Ok(HandlerResponse::text(join(param)))
}

fn pojo_list(args: &BoundArgs) -> Result<HandlerResponse, BindError> {
    let param: Vec<Pojo> = args.get_or_default(PARAM)?;
    Ok(HandlerResponse::text(join(
        param.into_iter().map(|pojo| or_null(pojo.field)),
    )))
}

fn string_list(args: &BoundArgs) -> Result<HandlerResponse, BindError> {
    let param: Vec<String> = args.get_or_default(PARAM)?;
    Ok(HandlerResponse::text(param.join("-")))
}
