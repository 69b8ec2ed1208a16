//! Image reference extraction from the provider's variable response envelope.
//!
//! Known shapes are probed in a fixed order and the first match wins:
//!
//! 1. `output.choices[*].message.content` as a list of parts or a single part,
//!    each possibly carrying an `image` field
//! 2. `data.url`
//! 3. top-level `url`
//! 4. `output.results[*].url`

use publisher_core::ImageReference;
use serde_json::Value;

use crate::{CallError, FailureKind, RawImageResponse};

type ShapeMatcher = fn(&Value) -> Option<String>;

const SHAPES: &[(&str, ShapeMatcher)] = &[
    ("output.choices[*].message.content", choices_content),
    ("data.url", data_url),
    ("url", top_level_url),
    ("output.results[*].url", results_url),
];

/// Returns the first image URL found in `raw`, if any.
pub fn extract_image_url(raw: &RawImageResponse) -> Option<String> {
    match raw {
        RawImageResponse::Text(text) => {
            let text = text.trim();
            if is_remote_url(text) {
                return Some(text.to_string());
            }
            if looks_like_json(text) {
                let value: Value = serde_json::from_str(text).ok()?;
                return match value {
                    Value::String(inner) => extract_image_url(&RawImageResponse::Text(inner)),
                    other => probe_shapes(&other),
                };
            }
            None
        }
        RawImageResponse::Structured(value) => probe_shapes(value),
    }
}

/// Extraction as a typed result for the orchestrator.
pub fn resolve_image_reference(raw: &RawImageResponse) -> Result<ImageReference, CallError> {
    extract_image_url(raw)
        .map(ImageReference::Remote)
        .ok_or_else(|| {
            CallError::new(
                FailureKind::NoImageReference,
                "no known shape matched the image response",
            )
        })
}

fn probe_shapes(value: &Value) -> Option<String> {
    SHAPES.iter().find_map(|(_, matcher)| matcher(value))
}

fn choices_content(value: &Value) -> Option<String> {
    value
        .pointer("/output/choices")?
        .as_array()?
        .iter()
        .filter_map(|choice| choice.pointer("/message/content"))
        .find_map(|content| match content {
            Value::Array(parts) => parts.iter().find_map(image_field),
            Value::Object(_) => image_field(content),
            _ => None,
        })
}

fn image_field(part: &Value) -> Option<String> {
    url_string(part.get("image")?)
}

fn data_url(value: &Value) -> Option<String> {
    url_string(value.pointer("/data/url")?)
}

fn top_level_url(value: &Value) -> Option<String> {
    url_string(value.get("url")?)
}

fn results_url(value: &Value) -> Option<String> {
    value
        .pointer("/output/results")?
        .as_array()?
        .iter()
        .find_map(|result| url_string(result.get("url")?))
}

fn url_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| is_remote_url(text))
        .map(ToOwned::to_owned)
}

fn is_remote_url(text: &str) -> bool {
    url::Url::parse(text)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[') || text.starts_with('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const URL: &str = "https://dashscope-result.oss.example.com/1.png?Expires=1";

    #[test]
    fn shape_names_are_in_probe_order() {
        let names: Vec<_> = SHAPES.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "output.choices[*].message.content",
                "data.url",
                "url",
                "output.results[*].url"
            ]
        );
    }

    #[test]
    fn equivalent_shapes_yield_same_url() {
        let direct = RawImageResponse::Text(URL.to_string());
        let json_string = RawImageResponse::Text(
            json!({"output": {"choices": [{"message": {"content": [{"image": URL}]}}]}})
                .to_string(),
        );
        let structured = RawImageResponse::Structured(json!({"data": {"url": URL}}));

        for raw in [direct, json_string, structured] {
            assert_eq!(extract_image_url(&raw).as_deref(), Some(URL), "{raw:?}");
        }
    }

    #[test]
    fn content_as_single_object() {
        let raw = RawImageResponse::Structured(
            json!({"output": {"choices": [{"message": {"content": {"image": URL}}}]}}),
        );
        assert_eq!(extract_image_url(&raw).as_deref(), Some(URL));
    }

    #[test]
    fn parts_without_image_are_skipped() {
        let raw = RawImageResponse::Structured(json!({
            "output": {"choices": [
                {"message": {"content": [{"text": "caption"}]}},
                {"message": {"content": [{"text": "x"}, {"image": URL}]}}
            ]}
        }));
        assert_eq!(extract_image_url(&raw).as_deref(), Some(URL));
    }

    #[test]
    fn earlier_shape_wins() {
        let raw = RawImageResponse::Structured(json!({
            "url": "https://top.example.com/x.png",
            "data": {"url": URL}
        }));
        assert_eq!(extract_image_url(&raw).as_deref(), Some(URL));
    }

    #[test]
    fn results_shape_and_top_level_url() {
        let raw = RawImageResponse::Structured(json!({"output": {"results": [{"url": URL}]}}));
        assert_eq!(extract_image_url(&raw).as_deref(), Some(URL));
        let raw = RawImageResponse::Text(json!({"url": URL}).to_string());
        assert_eq!(extract_image_url(&raw).as_deref(), Some(URL));
    }

    #[test]
    fn unknown_shapes_yield_nothing() {
        let cases = [
            RawImageResponse::Text("plain words".to_string()),
            RawImageResponse::Text("{broken json".to_string()),
            RawImageResponse::Text("ftp://files.example.com/a.png".to_string()),
            RawImageResponse::Structured(json!({"code": "InvalidApiKey", "message": "bad"})),
            RawImageResponse::Structured(json!({"data": {"url": "not a url"}})),
        ];
        for raw in cases {
            assert_eq!(extract_image_url(&raw), None, "{raw:?}");
        }
        let err = resolve_image_reference(&RawImageResponse::Structured(json!({}))).unwrap_err();
        assert_eq!(err.kind, FailureKind::NoImageReference);
    }
}
