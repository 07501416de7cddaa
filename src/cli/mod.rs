//! # CLI Module
//!
//! Command-line entry points for the `querybind` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Start the HTTP server with the hello resource mounted:
//!
//! ```bash
//! querybind serve --addr 0.0.0.0:8080
//! querybind serve --config service.yaml
//! ```
//!
//! Options:
//! - `--addr <ADDR>` - Bind address (also `QUERYBIND_ADDR`)
//! - `--config <FILE>` - YAML service configuration
//!
//! ### `convert`
//!
//! Run the generic JSON converter for a type without starting a server:
//!
//! ```bash
//! querybind convert --type 'map<string, integer>' --value '{"a":"1"}'
//! # {"a":1}
//! querybind convert --type 'sortedset<integer>' --value '[3,1,2]' --format
//! # [1,2,3]
//! ```
//!
//! ### `routes`
//!
//! List the registered routes and how each parameter is bound.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use querybind::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{convert, describe_routes, run_cli, Cli, Commands};
