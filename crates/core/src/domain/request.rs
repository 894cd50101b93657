// Crawl Request Domain Model

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;
use uuid::Uuid;

use crate::error::Result;

/// Request ID (UUID v4)
pub type RequestId = String;

/// Method used when no other is given
pub const DEFAULT_METHOD: &str = "GET";

/// A decoded unit of crawl work.
///
/// The queue core only ever moves the serialized form around; this type is
/// what the enqueue helpers build and what workers receive from the hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub id: RequestId,
    pub url: String,
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Link-hop distance from the seed request
    #[serde(default)]
    pub depth: u32,

    pub created_at: i64, // epoch ms
}

impl CrawlRequest {
    /// Create a default-GET request for an already-parsed URL
    pub fn new(url: Url) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            method: DEFAULT_METHOD.to_string(),
            body: None,
            headers: HashMap::new(),
            depth: 0,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Parse and validate a raw URL, then build a default-GET request
    ///
    /// # Errors
    /// - `QueueError::InvalidUrl` if the URL does not parse
    pub fn from_url(raw: &str) -> Result<Self> {
        let parsed = Url::parse(raw)?;
        Ok(Self::new(parsed))
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Serialize to the wire form stored in a backend
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode the wire form back into a request
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_defaults_to_get() {
        let req = CrawlRequest::from_url("http://example.com/page").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "http://example.com/page");
        assert_eq!(req.depth, 0);
    }

    #[test]
    fn from_url_rejects_garbage() {
        assert!(CrawlRequest::from_url("not a url").is_err());
        assert!(CrawlRequest::from_url("").is_err());
    }

    #[test]
    fn wire_form_round_trips() {
        let req = CrawlRequest::from_url("https://example.com/a?b=1")
            .unwrap()
            .with_method("POST")
            .with_body(b"payload".to_vec())
            .with_header("Accept", "text/html")
            .with_depth(3);

        let bytes = req.to_bytes().unwrap();
        let decoded = CrawlRequest::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn from_bytes_rejects_non_json() {
        assert!(CrawlRequest::from_bytes(b"\x00\x01\x02").is_err());
    }
}
