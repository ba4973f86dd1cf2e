//! Request specific parts of a [`Message`](crate::protocol::Message).
//!
//! A request carries its method, the requested resource and the raw query
//! string. Cookies of a request are sent back as a single `Cookie` header.

use bytes::{BufMut, BytesMut};
use http::Method;

use crate::protocol::FieldMap;

/// The method, resource and query of a request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: Method,
    resource: String,
    query: String,
}

impl Default for RequestLine {
    fn default() -> Self {
        Self { method: Method::GET, resource: String::from("/"), query: String::new() }
    }
}

impl RequestLine {
    pub fn new<S: Into<String>>(method: Method, resource: S) -> Self {
        Self { method, resource: resource.into(), query: String::new() }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn set_resource<S: Into<String>>(&mut self, resource: S) {
        self.resource = resource.into();
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query<S: Into<String>>(&mut self, query: S) {
        self.query = query.into();
    }

    /// Splits a request target into resource and query.
    pub(crate) fn set_target(&mut self, target: &str) {
        match target.split_once('?') {
            Some((resource, query)) => {
                self.resource = resource.to_string();
                self.query = query.to_string();
            }
            None => {
                self.resource = target.to_string();
                self.query.clear();
            }
        }
    }

    pub(crate) fn first_line(&self, version: &str) -> String {
        if self.query.is_empty() {
            format!("{} {} {}", self.method, self.resource, version)
        } else {
            format!("{} {}?{} {}", self.method, self.resource, self.query, version)
        }
    }
}

/// Writes every cookie as one `Cookie: a=1; b=2` line.
pub(crate) fn append_cookie_header(cookies: &FieldMap, dst: &mut BytesMut) {
    if cookies.is_empty() {
        return;
    }

    dst.put_slice(http::header::COOKIE.as_str().as_bytes());
    dst.put_slice(b": ");
    for (index, (name, value)) in cookies.iter().enumerate() {
        if index > 0 {
            dst.put_slice(b"; ");
        }
        dst.put_slice(name.as_bytes());
        dst.put_u8(b'=');
        dst.put_slice(value.as_bytes());
    }
    dst.put_slice(b"\r\n");
}

/// Fills `cookies` from the value of a `Cookie` request header.
///
/// Pairs without `=` and `$`-prefixed attributes are skipped.
pub(crate) fn parse_cookie_header(value: &str, cookies: &mut FieldMap) {
    for pair in value.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name.starts_with('$') {
            continue;
        }
        cookies.add(name, value.trim());
    }
}
