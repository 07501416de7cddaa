use super::{HandlerResponse, RouteError, Router};
use crate::binding::{BindError, ParamBinding};
use crate::query::QueryParams;
use crate::registry::{ConverterRegistry, JsonConverterProvider};
use crate::types::{RawType, TargetType, TypeDescriptor};
use http::Method;
use serde_json::json;
use std::sync::Arc;

fn router() -> Router {
    let mut registry = ConverterRegistry::new();
    registry.register(Arc::new(JsonConverterProvider::new()));
    Router::new(registry)
}

fn count_handler(args: &crate::binding::BoundArgs) -> Result<HandlerResponse, BindError> {
    let values: Vec<i64> = args.get_or_default("param")?;
    Ok(HandlerResponse::text(values.len().to_string()))
}

#[test]
fn test_route_lookup_and_invoke() {
    let mut router = router();
    router
        .add_route(
            Method::GET,
            "/count",
            "count",
            vec![ParamBinding::query(
                "param",
                TargetType::of(TypeDescriptor::set(TypeDescriptor::Integer)),
            )],
            count_handler,
        )
        .unwrap();

    let route = router.route(&Method::GET, "/count").unwrap();
    assert_eq!(route.handler_name, "count");
    assert!(route.params()[0].converter().is_some());

    let response = route.invoke(&QueryParams::parse("param=[1,1,2]")).unwrap();
    assert_eq!(response, HandlerResponse::text("2"));
    let response = route.invoke(&QueryParams::default()).unwrap();
    assert_eq!(response.body, json!("0"));
}

#[test]
fn test_trailing_slash_and_method_mismatch() {
    let mut router = router();
    router
        .add_route(Method::GET, "/count/", "count", Vec::new(), count_handler)
        .unwrap();
    assert!(router.route(&Method::GET, "/count").is_some());
    assert!(router.route(&Method::GET, "/count/").is_some());
    assert!(router.route(&Method::POST, "/count").is_none());
    assert!(router.has_path("/count"));
    assert!(!router.has_path("/other"));
}

#[test]
fn test_duplicate_route_rejected() {
    let mut router = router();
    router
        .add_route(Method::GET, "/a", "a", Vec::new(), count_handler)
        .unwrap();
    let err = router
        .add_route(Method::GET, "/a", "a2", Vec::new(), count_handler)
        .unwrap_err();
    assert!(matches!(err, RouteError::Duplicate { .. }));
    router
        .add_route(Method::POST, "/a", "a3", Vec::new(), count_handler)
        .unwrap();
    assert_eq!(router.len(), 2);
}

#[test]
fn test_unbindable_parameter_rejected() {
    let mut router = Router::new(ConverterRegistry::new());
    let err = router
        .add_route(
            Method::GET,
            "/map",
            "map",
            vec![ParamBinding::query("param", TargetType::erased(RawType::Map))],
            count_handler,
        )
        .unwrap_err();
    assert!(matches!(err, RouteError::Binding { .. }));
    assert!(err.to_string().contains("map"));
    assert!(router.is_empty());
}

#[test]
fn test_routes_sorted() {
    let mut router = router();
    for path in ["/b", "/a", "/c"] {
        router
            .add_route(Method::GET, path, path, Vec::new(), count_handler)
            .unwrap();
    }
    let paths: Vec<String> = router.routes().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, ["/a", "/b", "/c"]);
}
