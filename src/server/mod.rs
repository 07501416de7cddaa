//! HTTP surface: request parsing, response writing and the `may_minihttp` service.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, split_target, ParsedRequest};
pub use response::{write_handler_response, write_json_error};
pub use service::{health_endpoint, AppService};
