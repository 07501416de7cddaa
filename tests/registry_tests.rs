use querybind::binding::ParamBinding;
use querybind::converter::{ConversionError, JsonParamConverter, ParamConverter};
use querybind::hello;
use querybind::query::QueryParams;
use querybind::registry::{Annotation, ConverterRegistry, JsonConverterProvider};
use querybind::router::{HandlerResponse, Router};
use querybind::shape::ShapeError;
use querybind::types::{RawType, TargetType, TypeDescriptor};
use http::Method;
use serde_json::Value;
use std::sync::Arc;

/// Comma-separated integers, e.g. `1,2,3`.
#[derive(Debug)]
struct CsvConverter {
    target: TargetType,
}

impl ParamConverter for CsvConverter {
    fn target(&self) -> &TargetType {
        &self.target
    }

    fn parse(&self, text: &str) -> Result<Value, ConversionError> {
        text.split(',')
            .map(|part| {
                part.trim().parse::<i64>().map(Value::from).map_err(|_| {
                    ConversionError::Shape {
                        target: self.target.clone(),
                        source: ShapeError {
                            path: "$".to_string(),
                            expected: "integer".to_string(),
                            found: part.to_string(),
                        },
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn format(&self, value: &Value) -> Result<String, ConversionError> {
        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default())
    }
}

fn csv_registry() -> ConverterRegistry {
    let mut registry = ConverterRegistry::new();
    registry.register_fn(
        "csv",
        |_, annotations| annotations.iter().any(|a| a.name == "csv"),
        |target| Arc::new(CsvConverter { target: target.clone() }),
    );
    registry.register(Arc::new(JsonConverterProvider::new()));
    registry
}

fn int_list() -> TargetType {
    TargetType::of(TypeDescriptor::list(TypeDescriptor::Integer))
}

#[test]
fn test_first_matching_provider_wins() {
    let registry = csv_registry();
    let csv = Annotation::new("csv");

    let set = TargetType::of(TypeDescriptor::set(TypeDescriptor::Integer));
    let converter = registry.resolve(&set, &[csv.clone()]).unwrap();
    assert_eq!(converter.parse("1,2").unwrap(), serde_json::json!([1, 2]));

    let converter = registry.resolve(&set, &[]).unwrap();
    assert!(converter.parse("1,2").is_err());
}

#[test]
fn test_unclaimed_targets_resolve_to_none() {
    let registry = csv_registry();
    assert!(registry.resolve(&int_list(), &[]).is_none());
    assert!(registry
        .resolve(&TargetType::of(TypeDescriptor::String), &[])
        .is_none());
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_json_provider_claims_raw_collections() {
    let registry = hello::converter_registry();
    for raw in [RawType::Map, RawType::Set, RawType::SortedSet] {
        assert!(registry.resolve(&TargetType::erased(raw.clone()), &[]).is_some(), "{raw}");
    }
    assert!(registry.resolve(&TargetType::erased(RawType::List), &[]).is_none());
}

#[test]
fn test_nested_pojo_list_is_not_claimed() {
    let nested = TargetType::of(TypeDescriptor::list(TypeDescriptor::list(hello::pojo_type())));
    assert!(hello::converter_registry().resolve(&nested, &[]).is_none());

    let mut router = Router::new(hello::converter_registry());
    let result = router.add_route(
        Method::GET,
        "/nested",
        "nested",
        vec![ParamBinding::query("param", nested)],
        |_| Ok(HandlerResponse::text("")),
    );
    assert!(result.is_err());
}

#[test]
fn test_annotated_binding_uses_custom_converter() {
    let mut router = Router::new(csv_registry());
    router
        .add_route(
            Method::GET,
            "/sum",
            "sum",
            vec![ParamBinding::query("n", int_list()).with_annotation(Annotation::new("csv"))],
            |args| {
                let n: Vec<i64> = args.get_or_default("n")?;
                Ok(HandlerResponse::text(n.iter().sum::<i64>().to_string()))
            },
        )
        .unwrap();

    let route = router.route(&Method::GET, "/sum").unwrap();
    let response = route.invoke(&QueryParams::parse("n=1,2,3")).unwrap();
    assert_eq!(response.body, Value::String("6".to_string()));

    let err = route.invoke(&QueryParams::parse("n=1,x")).unwrap_err();
    assert_eq!(err.parameter(), "n");
    assert_eq!(err.status(), 400);
}

#[test]
fn test_json_converter_can_be_registered_directly() {
    let mut registry = ConverterRegistry::new();
    registry.register_fn(
        "bools",
        |target, _| target.element_type() == Some(&TypeDescriptor::Boolean),
        |target| Arc::new(JsonParamConverter::new(target.clone())),
    );
    let target = TargetType::of(TypeDescriptor::list(TypeDescriptor::Boolean));
    let converter = registry.resolve(&target, &[]).unwrap();
    let flags: Vec<bool> = converter.parse_as(r#"["true", false]"#).unwrap();
    assert_eq!(flags, vec![true, false]);
}
