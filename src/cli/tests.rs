//! Unit tests for CLI commands

use crate::cli::{convert, describe_routes, Cli, Commands};
use crate::hello;
use crate::types::TypeDescriptor;
use clap::Parser;

#[test]
fn test_serve_command_parse() {
    let cli = Cli::try_parse_from([
        "querybind",
        "serve",
        "--addr",
        "127.0.0.1:9090",
        "--config",
        "service.yaml",
    ])
    .unwrap();

    match cli.command {
        Commands::Serve { addr, config } => {
            assert_eq!(addr.as_deref(), Some("127.0.0.1:9090"));
            assert_eq!(config.unwrap().to_string_lossy(), "service.yaml");
        }
        _ => panic!("Expected Serve command"),
    }
}

#[test]
fn test_convert_command_parses_type() {
    let cli = Cli::try_parse_from([
        "querybind",
        "convert",
        "--type",
        "map<string, int>",
        "--value",
        r#"{"a":"1"}"#,
    ])
    .unwrap();

    match cli.command {
        Commands::Convert { ty, value, format } => {
            assert_eq!(
                ty,
                TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Integer)
            );
            assert_eq!(value, r#"{"a":"1"}"#);
            assert!(!format);
        }
        _ => panic!("Expected Convert command"),
    }
}

#[test]
fn test_convert_command_rejects_bad_type() {
    let result = Cli::try_parse_from(["querybind", "convert", "--type", "list<", "--value", "[]"]);
    assert!(result.is_err());
}

#[test]
fn test_convert_parse_and_format() {
    let ty: TypeDescriptor = "map<string, integer>".parse().unwrap();
    assert_eq!(convert(ty, r#"{"b":"2","a":1}"#, false).unwrap(), r#"{"b":2,"a":1}"#);

    let ty: TypeDescriptor = "sortedset<integer>".parse().unwrap();
    assert_eq!(convert(ty, "[3,1,2,1]", true).unwrap(), "[1,2,3]");
}

#[test]
fn test_convert_reports_errors() {
    let ty: TypeDescriptor = "set<integer>".parse().unwrap();
    assert!(convert(ty.clone(), "not json", false).is_err());
    assert!(convert(ty, "not json", true).is_err());
}

#[test]
fn test_describe_routes() {
    let router = hello::router().unwrap();
    let lines = describe_routes(&router);
    assert_eq!(lines.len(), 5);
    assert!(lines
        .iter()
        .any(|l| l == "GET /hello/stringlist -> string_list [param: list<string> (default)]"));
    assert!(lines
        .iter()
        .any(|l| l == "GET /hello/set -> set [param: set<integer> (converter)]"));
}
