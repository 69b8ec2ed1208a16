use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use publisher_logging::{pipeline_debug, pipeline_error, pipeline_info};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::fetch::{map_reqwest_error, read_json};
use crate::{CallError, Clock, FailureKind};

/// Tokens are treated as expired this long before the platform says they are.
pub const EXPIRY_MARGIN_SECS: i64 = 200;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TTL_SECS: i64 = 7200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Result of one credential exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in_secs: i64,
}

#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<TokenGrant, CallError>;
}

/// Credential exchange against the platform's `/cgi-bin/token` endpoint.
pub struct PlatformTokenSource {
    client: reqwest::Client,
    base_url: String,
    app_id: Option<String>,
    app_secret: Option<String>,
    timeout: Duration,
}

impl PlatformTokenSource {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        app_id: Option<String>,
        app_secret: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            app_id,
            app_secret,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

#[async_trait::async_trait]
impl TokenSource for PlatformTokenSource {
    async fn fetch_token(&self) -> Result<TokenGrant, CallError> {
        let (Some(app_id), Some(secret)) = (self.app_id.as_deref(), self.app_secret.as_deref())
        else {
            return Err(CallError::new(
                FailureKind::MissingCredentials,
                "WECHAT_APP_ID / WECHAT_APP_SECRET not configured",
            ));
        };

        let url = format!("{}/cgi-bin/token", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", app_id),
                ("secret", secret),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: TokenResponse = read_json(response).await?;

        match body.access_token.filter(|token| !token.is_empty()) {
            Some(access_token) => Ok(TokenGrant {
                access_token,
                expires_in_secs: body.expires_in.unwrap_or(DEFAULT_TTL_SECS),
            }),
            None => match body.errcode {
                Some(code) => Err(CallError::new(
                    FailureKind::Api {
                        code,
                        message: body.errmsg.unwrap_or_default(),
                    },
                    "token request rejected",
                )),
                None => Err(CallError::new(
                    FailureKind::MissingField("access_token"),
                    "token response without access_token",
                )),
            },
        }
    }
}

/// Process-lifetime access token cache.
///
/// The lock is held across the refresh call, so concurrent callers wait for a
/// single in-flight exchange instead of issuing their own.
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    clock: Clock,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>, clock: Clock) -> Self {
        Self {
            source,
            clock,
            slot: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, CallError> {
        let mut slot = self.slot.lock().await;
        let now = (self.clock)();
        if let Some(token) = slot.as_ref().filter(|token| token.is_fresh(now)) {
            pipeline_debug!("reusing cached access token (expires {})", token.expires_at);
            return Ok(token.value.clone());
        }

        let grant = self.source.fetch_token().await.map_err(|err| {
            pipeline_error!("access token refresh failed: {}", err);
            err
        })?;
        let lifetime = (grant.expires_in_secs - EXPIRY_MARGIN_SECS).max(0);
        let token = AccessToken {
            value: grant.access_token,
            expires_at: now + chrono::Duration::seconds(lifetime),
        };
        pipeline_info!("access token refreshed (valid until {})", token.expires_at);
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    /// Drops the cached token; the next call refreshes.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn cached(&self) -> Option<AccessToken> {
        self.slot.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    struct CountingSource {
        calls: AtomicUsize,
        ttl: i64,
    }

    #[async_trait::async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<TokenGrant, CallError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(TokenGrant {
                access_token: format!("token-{n}"),
                expires_in_secs: self.ttl,
            })
        }
    }

    fn manual_clock(start: DateTime<Utc>) -> (Clock, Arc<StdMutex<DateTime<Utc>>>) {
        let now = Arc::new(StdMutex::new(start));
        let handle = now.clone();
        let clock: Clock = Arc::new(move || *handle.lock().unwrap());
        (clock, now)
    }

    #[tokio::test]
    async fn expiry_applies_margin() {
        let start = Utc::now();
        let (clock, now) = manual_clock(start);
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            ttl: 7200,
        });
        let cache = TokenCache::new(source.clone(), clock);

        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        let cached = cache.cached().await.unwrap();
        assert_eq!(cached.expires_at, start + chrono::Duration::seconds(7000));

        *now.lock().unwrap() = start + chrono::Duration::seconds(6999);
        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        *now.lock().unwrap() = start + chrono::Duration::seconds(7000);
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let (clock, _now) = manual_clock(Utc::now());
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            ttl: 7200,
        });
        let cache = Arc::new(TokenCache::new(source.clone(), clock));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.access_token().await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refresh() {
        let (clock, _now) = manual_clock(Utc::now());
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            ttl: 7200,
        });
        let cache = TokenCache::new(source.clone(), clock);

        cache.access_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
    }
}
