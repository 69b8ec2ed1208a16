use std::sync::Arc;

use serde::Deserialize;

use crate::token::TokenCache;
use crate::{CallError, FailureKind};

/// Authenticated access to the publishing platform's API.
#[derive(Clone)]
pub struct PlatformClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenCache>,
}

impl PlatformClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, tokens: Arc<TokenCache>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn access_token(&self) -> Result<String, CallError> {
        self.tokens.access_token().await
    }

    /// Drops the cached token when the platform rejected it, so the next call refreshes.
    pub async fn observe(&self, error: &CallError) {
        if let FailureKind::Api { code, .. } = error.kind {
            if TOKEN_ERROR_CODES.contains(&code) {
                self.tokens.invalidate().await;
            }
        }
    }
}

/// invalid credential, access_token expired, invalid access_token
const TOKEN_ERROR_CODES: [i64; 3] = [40001, 42001, 40014];

/// Envelope shared by media and draft responses: an id on success, `errcode`/`errmsg` otherwise.
#[derive(Debug, Deserialize)]
pub(crate) struct MediaEnvelope {
    pub media_id: Option<String>,
    pub errcode: Option<i64>,
    pub errmsg: Option<String>,
}

impl MediaEnvelope {
    pub(crate) fn into_media_id(self) -> Result<String, CallError> {
        if let Some(id) = self.media_id.filter(|id| !id.is_empty()) {
            return Ok(id);
        }
        match self.errcode {
            Some(code) if code != 0 => Err(CallError::new(
                FailureKind::Api {
                    code,
                    message: self.errmsg.unwrap_or_default(),
                },
                "",
            )),
            _ => Err(CallError::new(
                FailureKind::MissingField("media_id"),
                "response without media_id",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MediaEnvelope;
    use crate::FailureKind;

    fn parse(body: &str) -> MediaEnvelope {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn envelope_variants() {
        assert_eq!(
            parse(r#"{"media_id":"M1","url":"http://x"}"#).into_media_id(),
            Ok("M1".to_string())
        );
        let err = parse(r#"{"errcode":40001,"errmsg":"invalid credential"}"#)
            .into_media_id()
            .unwrap_err();
        assert_eq!(
            err.kind,
            FailureKind::Api {
                code: 40001,
                message: "invalid credential".to_string()
            }
        );
        let err = parse(r#"{"errcode":0}"#).into_media_id().unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingField("media_id"));
    }
}
