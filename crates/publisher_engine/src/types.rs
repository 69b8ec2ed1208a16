use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

pub use publisher_core::{CallError, FailureKind};

/// Source of "now"; injected so token expiry and archive names are testable.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Raw body returned by the image provider. Its envelope is not contractually fixed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawImageResponse {
    /// A bare string: either a URL or JSON text that still has to be parsed.
    Text(String),
    Structured(Value),
}

impl RawImageResponse {
    /// Classifies an HTTP body. JSON strings are unwrapped to [`RawImageResponse::Text`].
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(text)) => RawImageResponse::Text(text),
            Ok(value @ (Value::Object(_) | Value::Array(_))) => RawImageResponse::Structured(value),
            _ => RawImageResponse::Text(body.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub final_url: String,
}

#[cfg(test)]
mod tests {
    use super::RawImageResponse;
    use serde_json::json;

    #[test]
    fn body_classification() {
        assert_eq!(
            RawImageResponse::from_body("https://a/b.png"),
            RawImageResponse::Text("https://a/b.png".to_string())
        );
        assert_eq!(
            RawImageResponse::from_body("\"{\\\"url\\\":\\\"https://a\\\"}\""),
            RawImageResponse::Text("{\"url\":\"https://a\"}".to_string())
        );
        assert_eq!(
            RawImageResponse::from_body("{\"url\":\"https://a\"}"),
            RawImageResponse::Structured(json!({"url": "https://a"}))
        );
    }
}
