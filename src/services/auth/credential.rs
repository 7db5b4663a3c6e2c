//! Credential extraction from the three carriers.
//!
//! Priority is fixed: header, then parsed JSON body, then cookie. The first carrier that holds
//! a non-empty value wins and the others are never consulted.

use std::collections::HashMap;
use std::fmt;

use axum::http::{HeaderMap, header};
use cookie::Cookie;
use serde::Serialize;
use serde_json::{Map, Value};

/// Where the credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Header,
    Body,
    Cookie,
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Carrier::Header => "header",
            Carrier::Body => "body",
            Carrier::Cookie => "cookie",
        };
        f.write_str(name)
    }
}

/// Raw token string plus the carrier it came from. Opaque until verified.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub carrier: Carrier,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Token is a bearer secret
        f.debug_struct("Credential")
            .field("carrier", &self.carrier)
            .field("token_len", &self.token.len())
            .finish()
    }
}

/// Cookie name → value, parsed from every `Cookie` header on the request.
///
/// Values are percent-decoded and surrounding quotes are dropped. Pairs that do not parse are
/// skipped. When a name repeats, the first occurrence is kept (user agents send the most
/// specific cookie first).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse_encoded(raw).filter_map(Result::ok) {
                cookies
                    .entry(cookie.name().to_string())
                    .or_insert_with(|| cookie.value_trimmed().to_string());
            }
        }
        Self(cookies)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Non-empty header value for `name`. Non-UTF-8 bytes are kept (lossily) so that a garbled
/// header is still selected and then fails verification.
pub fn header_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .filter(|v| !v.is_empty())
}

/// Read-only view of the parts of a request the gate may look at.
pub struct IncomingRequest<'a> {
    headers: &'a HeaderMap,
    body: Option<&'a Map<String, Value>>,
    cookies: Cookies,
}

impl<'a> IncomingRequest<'a> {
    pub fn new(headers: &'a HeaderMap, body: Option<&'a Map<String, Value>>) -> Self {
        Self {
            headers,
            body,
            cookies: Cookies::from_headers(headers),
        }
    }

    pub fn header(&self, name: &str) -> Option<String> {
        header_token(self.headers, name)
    }

    /// Falsy values (`null`, `false`, `0`, `""`) count as absent. Any other non-string value
    /// is returned as its JSON text so that it fails verification instead of falling through
    /// to the cookie.
    pub fn body_field(&self, name: &str) -> Option<String> {
        match self.body?.get(name)? {
            Value::Null | Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .get(name)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Pick the credential for `field` by carrier priority.
    pub fn credential(&self, field: &str) -> Option<Credential> {
        self.header(field)
            .map(|token| (token, Carrier::Header))
            .or_else(|| self.body_field(field).map(|token| (token, Carrier::Body)))
            .or_else(|| self.cookie(field).map(|token| (token, Carrier::Cookie)))
            .map(|(token, carrier)| Credential { token, carrier })
    }
}
