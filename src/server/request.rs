use crate::ids::RequestId;
use crate::query::QueryParams;
use may_minihttp::Request;
use tracing::debug;

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug, PartialEq)]
pub struct ParsedRequest {
    /// Taken from `x-request-id` when it holds a ULID, otherwise generated
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// Decoded query string parameters, repeats preserved
    pub query: QueryParams,
}

/// Split a request target into its path and decoded query parameters.
///
/// An empty path becomes `/`.
#[must_use]
pub fn split_target(target: &str) -> (String, QueryParams) {
    let path = target.split('?').next().unwrap_or("/");
    let path = if path.is_empty() { "/" } else { path };
    (path.to_string(), QueryParams::from_target(target))
}

/// Extract method, path and query parameters from a `may_minihttp::Request`.
#[must_use]
pub fn parse_request(req: &Request) -> ParsedRequest {
    let method = req.method().to_string();
    let (path, query) = split_target(req.path());

    let request_id_header = req
        .headers()
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("x-request-id"))
        .and_then(|h| std::str::from_utf8(h.value).ok());
    let request_id = RequestId::from_header_or_new(request_id_header);

    debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        param_count = query.len(),
        param_names = ?query.iter().map(|(k, _)| k).collect::<Vec<_>>(),
        "HTTP request parsed"
    );

    ParsedRequest {
        request_id,
        method,
        path,
        query,
    }
}
