use crate::config::{RuntimeConfig, ServiceConfig};
use crate::converter::{JsonParamConverter, ParamConverter};
use crate::hello;
use crate::router::Router;
use crate::server::{AppService, HttpServer};
use crate::types::{TargetType, TypeDescriptor};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for querybind
#[derive(Parser)]
#[command(name = "querybind")]
#[command(about = "JSON query-parameter binding service", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the hello resource over HTTP
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8080
        #[arg(long, env = "QUERYBIND_ADDR")]
        addr: Option<String>,

        /// YAML service configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Convert a parameter value with the generic JSON converter
    Convert {
        /// Target type, e.g. `list<Pojo{field: integer}>`
        #[arg(short = 't', long = "type")]
        ty: TypeDescriptor,

        /// Parameter text (or a JSON value with --format)
        #[arg(short, long)]
        value: String,

        /// Format a JSON value into parameter text instead of parsing
        #[arg(long, default_value_t = false)]
        format: bool,
    },
    /// List registered routes and their parameter bindings
    Routes,
}

/// Execute the parsed command.
///
/// # Errors
///
/// Returns an error when configuration cannot be loaded, the server cannot start,
/// or a conversion fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { addr, config } => {
            let mut settings = match &config {
                Some(path) => ServiceConfig::load(path)?,
                None => ServiceConfig::default(),
            }
            .with_runtime(&RuntimeConfig::from_env());
            if let Some(addr) = addr {
                settings.addr = addr;
            }

            may::config().set_stack_size(settings.stack_size);
            let router = hello::router().context("failed to register hello routes")?;
            info!(
                addr = %settings.addr,
                stack_size = settings.stack_size,
                routes = router.len(),
                "Starting server"
            );
            let handle = HttpServer(AppService::new(router))
                .start(settings.addr.as_str())
                .with_context(|| format!("failed to bind {}", settings.addr))?;
            info!(addr = %handle.addr(), "Listening");
            handle
                .join()
                .map_err(|e| anyhow!("server coroutine panicked: {e:?}"))?;
            Ok(())
        }
        Commands::Convert { ty, value, format } => {
            println!("{}", convert(ty, &value, format)?);
            Ok(())
        }
        Commands::Routes => {
            let router = hello::router().context("failed to register hello routes")?;
            for line in describe_routes(&router) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Parse `value` as parameter text for `ty` and render the result as compact JSON,
/// or with `format` set, read `value` as JSON and render it as parameter text.
///
/// # Errors
///
/// Returns an error when the conversion fails.
pub fn convert(ty: TypeDescriptor, value: &str, format: bool) -> Result<String> {
    let converter = JsonParamConverter::new(TargetType::of(ty));
    if format {
        let json: Value = serde_json::from_str(value).context("--value is not valid JSON")?;
        Ok(converter.format(&json)?)
    } else {
        let parsed = converter.parse(value)?;
        Ok(serde_json::to_string(&parsed)?)
    }
}

/// One line per route: method, path, handler and parameter bindings.
#[must_use]
pub fn describe_routes(router: &Router) -> Vec<String> {
    router
        .routes()
        .iter()
        .map(|route| {
            let params = route
                .params()
                .iter()
                .map(|param| {
                    let how = if param.converter().is_some() {
                        "converter"
                    } else {
                        "default"
                    };
                    format!("{}: {} ({how})", param.name(), param.binding().target)
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{} {} -> {} [{params}]",
                route.method, route.path, route.handler_name
            )
        })
        .collect()
}
