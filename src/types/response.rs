//! Response-side types.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::{Error, Result};

/// How a response body should be interpreted, resolved once from `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
    Binary,
}

impl ContentKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(raw) = content_type else {
            return ContentKind::Binary;
        };
        let mime = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if mime == "application/json" || mime.ends_with("+json") {
            ContentKind::Json
        } else if mime.starts_with("text/") {
            ContentKind::Text
        } else {
            ContentKind::Binary
        }
    }
}

/// Decoded response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    Binary(Bytes),
}

impl ResponseBody {
    /// Decode raw bytes according to `kind`.
    ///
    /// An empty JSON body decodes to `null` (e.g. `204 No Content` with a JSON
    /// content type).
    pub fn decode(kind: ContentKind, content_type: &str, bytes: Bytes) -> Result<Self> {
        match kind {
            ContentKind::Json if bytes.is_empty() => Ok(ResponseBody::Json(serde_json::Value::Null)),
            ContentKind::Json => serde_json::from_slice(&bytes)
                .map(ResponseBody::Json)
                .map_err(|e| Error::decode(content_type, e.to_string())),
            ContentKind::Text => String::from_utf8(bytes.to_vec())
                .map(ResponseBody::Text)
                .map_err(|e| Error::decode(content_type, e.to_string())),
            ContentKind::Binary => Ok(ResponseBody::Binary(bytes)),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ResponseBody::Json(_) => ContentKind::Json,
            ResponseBody::Text(_) => ContentKind::Text,
            ResponseBody::Binary(_) => ContentKind::Binary,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Convert into a caller-chosen type.
    ///
    /// Text converts as a JSON string and an empty binary body as `null`, so
    /// `String`, `Option<_>`, `()` and `serde_json::Value` all work as targets.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        let value = match self {
            ResponseBody::Json(v) => v,
            ResponseBody::Text(s) => serde_json::Value::String(s),
            ResponseBody::Binary(b) if b.is_empty() => serde_json::Value::Null,
            ResponseBody::Binary(b) => {
                return Err(Error::decode(
                    "application/octet-stream",
                    format!(
                        "{} byte binary payload cannot be converted to a typed value; use `send` for raw access",
                        b.len()
                    ),
                ))
            }
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// Response returned to callers, from the network, the cache or a shared
/// in-flight call alike.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T = ResponseBody> {
    pub data: T,
    pub status: u16,
    pub status_text: String,
    /// Lower-cased header names; repeated headers joined with `", "`.
    pub headers: HashMap<String, String>,
}

impl<T> ApiResponse<T> {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
        }
    }
}

impl ApiResponse<ResponseBody> {
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<ApiResponse<T>> {
        let ApiResponse {
            data,
            status,
            status_text,
            headers,
        } = self;
        Ok(ApiResponse {
            data: data.into_typed()?,
            status,
            status_text,
            headers,
        })
    }
}

/// Flatten raw header pairs: lower-case names, repeated values joined with `", "`.
pub(crate) fn flatten_headers(raw: Vec<(String, String)>) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::with_capacity(raw.len());
    for (name, value) in raw {
        headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
}
