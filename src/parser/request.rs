//! HTTP request parsing and representation.

use std::collections::HashMap;
use log::warn;

use crate::parser::error::Error;
use crate::parser::header::HeaderField;

/// Size of the single read that must hold the request line and all headers.
pub const HEADER_BUFFER_SIZE: usize = 8192;

/// Represents an HTTP request.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// The HTTP method, as sent by the client
    pub method: String,
    /// The request path, including any query string
    pub path: String,
    /// The protocol version token of the request line
    pub version: String,
    /// The recognized header fields
    pub headers: HashMap<HeaderField, String>,
    /// The declared body length, if a valid Content-Length was sent
    pub content_length: Option<usize>,
    /// The request body, once read
    pub body: Option<Vec<u8>>,
    /// Query parameters parsed from the path
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a new HTTP request without headers or body.
    ///
    /// Query parameters are parsed from `path` immediately.
    pub fn new(method: impl Into<String>, path: impl Into<String>, version: impl Into<String>) -> Self {
        let path = path.into();
        let query_params = parse_query(&path);

        Self {
            method: method.into(),
            path,
            version: version.into(),
            headers: HashMap::new(),
            content_length: None,
            body: None,
            query_params,
        }
    }

    /// Get a header value.
    pub fn header(&self, field: HeaderField) -> Option<&str> {
        self.headers.get(&field).map(String::as_str)
    }

    /// Check if a header was sent.
    pub fn has_header(&self, field: HeaderField) -> bool {
        self.headers.contains_key(&field)
    }

    /// The path with any query string removed. This is what routes match against.
    pub fn route_path(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// The body bytes, or an empty slice when there is no body.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }
}

fn parse_query(path: &str) -> HashMap<String, String> {
    path.split_once('?')
        .map(|(_, query)| query
            .split('&')
            .filter(|s| !s.is_empty())
            .map(|pair| {
                if let Some((k, v)) = pair.split_once('=') {
                    (k.to_string(), v.to_string())
                } else {
                    (pair.to_string(), String::new())
                }
            })
            .collect())
        .unwrap_or_default()
}

/// Find the line starting at `start`.
///
/// Returns the line without its `\n` (and `\r`, if present) together with the
/// offset just past the terminator. `None` when no terminator follows `start`.
fn next_line(input: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let end = start + input[start..].iter().position(|&b| b == b'\n')?;
    let line = &input[start..end];
    let line = line.strip_suffix(&b"\r"[..]).unwrap_or(line);
    Some((line, end + 1))
}

/// Split a `Name: Value` line at its first colon-space.
fn split_header_line(line: &[u8]) -> Option<(&str, &str)> {
    let sep = line.windows(2).position(|w| w == b": ")?;
    let name = std::str::from_utf8(&line[..sep]).ok()?;
    let value = std::str::from_utf8(&line[sep + 2..]).ok()?;
    Some((name, value))
}

/// Parse an HTTP request from the bytes of one header read.
///
/// Header lines are read up to the first empty line. Any bytes after that line
/// are the start of the body and end up in [`HttpRequest::body`]. Header fields
/// outside [`HeaderField`] are logged and dropped.
///
/// # Errors
///
/// Fails when the buffer is empty, has no terminated request line, or the
/// request line is not exactly `METHOD SP PATH SP VERSION`. A buffer of at
/// least [`HEADER_BUFFER_SIZE`] bytes without the empty line that ends the
/// headers was cut short and fails with [`Error::HeadersTooLarge`].
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let (line, mut cursor) = next_line(input, 0).ok_or(Error::IncompleteRequest)?;
    let request_line = std::str::from_utf8(line)
        .map_err(|_| Error::MalformedRequestLine(String::from_utf8_lossy(line).into_owned()))?;

    // Split the request line into method, path, and version
    let mut tokens = request_line.splitn(3, ' ');
    let (method, path, version) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(method), Some(path), Some(version))
            if !method.is_empty() && !path.is_empty() && !version.is_empty() && !version.contains(' ') =>
        {
            (method, path, version)
        }
        _ => return Err(Error::MalformedRequestLine(request_line.to_string())),
    };

    let mut request = HttpRequest::new(method, path, version);

    let mut terminated = false;
    while let Some((line, next)) = next_line(input, cursor) {
        cursor = next;

        // Empty line indicates the end of headers
        if line.is_empty() {
            terminated = true;
            break;
        }

        let Some((name, value)) = split_header_line(line) else {
            warn!("Skipping malformed header line: {}", String::from_utf8_lossy(line));
            continue;
        };

        let Some(field) = HeaderField::from_name(name) else {
            warn!("Dropping unrecognized header {name} with value {value}");
            continue;
        };

        if field == HeaderField::ContentLength {
            request.content_length = match value.trim().parse::<usize>() {
                Ok(length) => Some(length),
                Err(_) => {
                    warn!("Ignoring invalid Content-Length: {value}");
                    None
                }
            };
        }

        request.headers.insert(field, value.to_string());
    }

    if !terminated && input.len() >= HEADER_BUFFER_SIZE {
        return Err(Error::HeadersTooLarge(HEADER_BUFFER_SIZE));
    }

    if terminated && cursor < input.len() {
        request.body = Some(input[cursor..].to_vec());
    }

    Ok(request)
}
