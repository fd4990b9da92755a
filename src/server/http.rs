//! Minimal HTTP/1.1 request parsing and response encoding.
//!
//! Only what a static file server needs: the request line and headers are
//! parsed, request bodies are ignored, and every response closes the
//! connection.

use std::fmt;

use crate::config::CorsConfig;
use crate::error::{Result, WorkbenchError};

/// Upper bound on the size of a request head
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Options,
    Other(String),
}

impl Method {
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Head => write!(f, "HEAD"),
            Method::Options => write!(f, "OPTIONS"),
            Method::Other(m) => write!(f, "{}", m),
        }
    }
}

/// A parsed request head
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Raw request target as sent by the client
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Parse the request line and headers (everything before the blank line)
    pub fn parse(head: &str) -> Result<Self> {
        let mut lines = head.split("\r\n").flat_map(|l| l.split('\n'));
        let request_line = lines
            .next()
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| WorkbenchError::InvalidInput("empty request".to_string()))?;

        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(WorkbenchError::InvalidInput(format!("malformed request line: {}", request_line)));
        };
        if !version.starts_with("HTTP/") {
            return Err(WorkbenchError::InvalidInput(format!("unsupported protocol: {}", version)));
        }

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(WorkbenchError::InvalidInput(format!("malformed header: {}", line)));
            };
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self {
            method: Method::parse(method),
            target: target.to_string(),
            version: version.to_string(),
            headers,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path component of the target, without query or fragment, still encoded
    pub fn raw_path(&self) -> &str {
        let end = self.target.find(['?', '#']).unwrap_or(self.target.len());
        &self.target[..end]
    }

    /// Query string including the leading `?`, or empty
    pub fn query(&self) -> &str {
        match self.target.find('?') {
            Some(start) => {
                let rest = &self.target[start..];
                let end = rest.find('#').unwrap_or(rest.len());
                &rest[..end]
            }
            None => "",
        }
    }
}

/// Escape text for inclusion in generated HTML
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Decode `%XX` escapes; malformed escapes are kept literally
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Encode a path segment for use in an href
pub fn percent_encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoContent,
    MovedPermanently,
    BadRequest,
    Forbidden,
    NotFound,
    InternalServerError,
    NotImplemented,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NoContent => 204,
            Status::MovedPermanently => 301,
            Status::BadRequest => 400,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::InternalServerError => 500,
            Status::NotImplemented => 501,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NoContent => "No Content",
            Status::MovedPermanently => "Moved Permanently",
            Status::BadRequest => "Bad Request",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented => "Not Implemented",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(status: Status, content_type: &str, body: Vec<u8>) -> Self {
        Self::new(status).header("Content-Type", content_type).body(body)
    }

    /// Small HTML page describing an error status
    pub fn error(status: Status, message: &str) -> Self {
        let html = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\n\
             <body><h1>{code} {reason}</h1><p>{message}</p></body></html>\n",
            code = status.code(),
            reason = status.reason(),
            message = escape_html(message),
        );
        Self::with_body(status, "text/html; charset=utf-8", html.into_bytes())
    }

    pub fn redirect(location: &str) -> Self {
        Self::new(Status::MovedPermanently).header("Location", location)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Attach the cross-origin headers sent on every response
    pub fn with_cors(self, cors: &CorsConfig) -> Self {
        self.header("Access-Control-Allow-Origin", &cors.allow_origin)
            .header("Access-Control-Allow-Methods", &cors.allow_methods)
            .header("Access-Control-Allow-Headers", &cors.allow_headers)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize status line, headers and (unless `head_only`) the body
    pub fn to_bytes(&self, head_only: bool) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status.code(), self.status.reason());
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        if !head_only {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_line_and_headers() {
        let req = Request::parse("GET /post1.html?t=123 HTTP/1.1\r\nHost: localhost:8000\r\nAccept: */*\r\n").unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.target, "/post1.html?t=123");
        assert_eq!(req.version, "HTTP/1.1");
        assert_eq!(req.header("host"), Some("localhost:8000"));
        assert_eq!(req.raw_path(), "/post1.html");
        assert_eq!(req.query(), "?t=123");
    }

    #[test]
    fn test_parse_other_method() {
        let req = Request::parse("POST /api HTTP/1.1\r\n").unwrap();
        assert_eq!(req.method, Method::Other("POST".to_string()));
        assert_eq!(req.method.to_string(), "POST");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Request::parse("").is_err());
        assert!(Request::parse("GET /\r\n").is_err());
        assert!(Request::parse("GET / FTP/1.0\r\n").is_err());
        assert!(Request::parse("GET / HTTP/1.1\r\nno-colon\r\n").is_err());
    }

    #[test]
    fn test_fragment_is_dropped() {
        let req = Request::parse("GET /a.html#top HTTP/1.1\r\n").unwrap();
        assert_eq!(req.raw_path(), "/a.html");
        assert_eq!(req.query(), "");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/my%20notes.md"), "/my notes.md");
        assert_eq!(percent_decode("/%E5%8D%9A%E5%AE%A2"), "/博客");
        assert_eq!(percent_decode("/100%"), "/100%");
        assert_eq!(percent_decode("/%zz"), "/%zz");
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("my notes.md"), "my%20notes.md");
        assert_eq!(percent_encode("a-b_c.d~"), "a-b_c.d~");
    }

    #[test]
    fn test_response_bytes_include_length_and_close() {
        let resp = Response::with_body(Status::Ok, "text/plain", b"hello".to_vec());
        let text = String::from_utf8(resp.to_bytes(false)).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_head_only_omits_body() {
        let resp = Response::with_body(Status::Ok, "text/plain", b"hello".to_vec());
        let text = String::from_utf8(resp.to_bytes(true)).unwrap();
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let resp = Response::error(Status::BadRequest, "malformed request line: <script>");
        let body = String::from_utf8(resp.body).unwrap();
        assert!(body.contains("400 Bad Request"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_cors_headers() {
        let resp = Response::new(Status::NoContent).with_cors(&CorsConfig::default());
        assert_eq!(resp.header_value("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(resp.header_value("Access-Control-Allow-Methods"), Some("GET, POST, OPTIONS"));
        assert_eq!(resp.header_value("Access-Control-Allow-Headers"), Some("Content-Type"));
    }
}
