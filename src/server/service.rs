use super::request::{parse_request, ParsedRequest};
use super::response::{write_handler_response, write_json_error};
use crate::router::{HandlerResponse, Router};
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// `may_minihttp` service dispatching requests to the routes of a [`Router`].
///
/// Cloned once per connection; the router is shared and never mutated after startup.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
}

impl AppService {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    write_handler_response(res, HandlerResponse::json(200, json!({ "status": "ok" })));
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let start = Instant::now();
        let ParsedRequest {
            request_id,
            method,
            path,
            query,
        } = parse_request(&req);

        if method == "GET" && path == "/health" {
            return health_endpoint(res);
        }

        let Ok(parsed_method) = method.parse::<Method>() else {
            write_json_error(
                res,
                400,
                json!({"error": "Invalid method", "method": method}),
            );
            return Ok(());
        };

        let Some(route) = self.router.route(&parsed_method, &path) else {
            let status = if self.router.has_path(&path) { 405 } else { 404 };
            warn!(request_id = %request_id, method = %method, path = %path, status, "No route matched");
            let message = if status == 405 { "Method Not Allowed" } else { "Not Found" };
            write_json_error(
                res,
                status,
                json!({"error": message, "method": method, "path": path}),
            );
            return Ok(());
        };

        // A panicking handler must not take the connection coroutine down with it
        let outcome = catch_unwind(AssertUnwindSafe(|| route.invoke(&query)));
        match outcome {
            Ok(Ok(response)) => {
                info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    handler = %route.handler_name,
                    status = response.status,
                    latency_us = start.elapsed().as_micros() as u64,
                    "Request handled"
                );
                write_handler_response(res, response);
            }
            Ok(Err(err)) => {
                warn!(
                    request_id = %request_id,
                    handler = %route.handler_name,
                    parameter = err.parameter(),
                    error = %err,
                    "Parameter binding failed"
                );
                write_json_error(
                    res,
                    err.status(),
                    json!({
                        "error": "Invalid parameter",
                        "parameter": err.parameter(),
                        "message": err.to_string(),
                    }),
                );
            }
            Err(panic) => {
                error!(
                    request_id = %request_id,
                    handler = %route.handler_name,
                    panic = ?panic,
                    "Handler panicked"
                );
                write_json_error(
                    res,
                    500,
                    json!({"error": "Handler panicked", "handler": route.handler_name}),
                );
            }
        }
        Ok(())
    }
}
