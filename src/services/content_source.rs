//! Content lookup for new rounds: a remote meme provider with a local fallback pool.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use rand::{rng, seq::IndexedRandom};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ContentConfig;

/// Returned when even the fallback pool is empty.
const LAST_RESORT_CONTENT: &str = "/memes/meme1.png";

/// Failures of a remote content lookup. They never leave the resolver.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to build content client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    #[error("content request failed")]
    Request {
        #[source]
        source: reqwest::Error,
    },
    #[error("content provider answered with status {0}")]
    Status(StatusCode),
    #[error("content provider sent an unreadable payload")]
    Decode {
        #[source]
        source: reqwest::Error,
    },
    #[error("content provider sent no usable url")]
    MissingUrl,
    #[error("content provider did not answer within {0:?}")]
    Timeout(Duration),
}

/// Remote provider of content references.
pub trait ContentSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'static, Result<String, ContentError>>;
}

#[derive(Debug, Deserialize)]
struct MemeApiResponse {
    #[serde(default)]
    url: Option<String>,
}

/// Client for meme-api style providers answering `{ "url": "..." }`.
#[derive(Clone)]
pub struct MemeApiSource {
    client: Client,
    url: Arc<str>,
}

impl MemeApiSource {
    pub fn new(url: impl Into<Arc<str>>, request_timeout: Duration) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|source| ContentError::ClientBuilder { source })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl ContentSource for MemeApiSource {
    fn fetch(&self) -> BoxFuture<'static, Result<String, ContentError>> {
        let api = self.clone();
        Box::pin(async move {
            let response = api
                .client
                .get(&*api.url)
                .send()
                .await
                .map_err(|source| ContentError::Request { source })?;

            if !response.status().is_success() {
                return Err(ContentError::Status(response.status()));
            }

            let payload = response
                .json::<MemeApiResponse>()
                .await
                .map_err(|source| ContentError::Decode { source })?;

            payload
                .url
                .map(|url| url.trim().to_string())
                .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
                .ok_or(ContentError::MissingUrl)
        })
    }
}

/// Supplies the content reference of each new round. Never fails.
#[derive(Clone)]
pub struct ContentResolver {
    remote: Option<Arc<dyn ContentSource>>,
    pool: Arc<[String]>,
    fetch_timeout: Duration,
}

impl ContentResolver {
    pub fn new(
        remote: Option<Arc<dyn ContentSource>>,
        pool: Vec<String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            pool: pool.into(),
            fetch_timeout,
        }
    }

    /// Resolver that only ever draws from the local pool.
    pub fn local(pool: Vec<String>) -> Self {
        Self::new(None, pool, Duration::from_secs(1))
    }

    /// Build the resolver described by the configuration, degrading to the
    /// local pool when the HTTP client cannot be created.
    pub fn from_config(config: &ContentConfig) -> Self {
        let remote = config.remote_url.as_ref().and_then(|url| {
            match MemeApiSource::new(url.as_str(), config.fetch_timeout) {
                Ok(source) => Some(Arc::new(source) as Arc<dyn ContentSource>),
                Err(err) => {
                    warn!(error = %err, "remote content disabled");
                    None
                }
            }
        });
        Self::new(remote, config.fallback_pool.clone(), config.fetch_timeout)
    }

    /// Deterministic reference for the bootstrap round, so reads never wait on the network.
    pub fn bootstrap_ref(&self) -> String {
        self.pool
            .first()
            .cloned()
            .unwrap_or_else(|| LAST_RESORT_CONTENT.to_string())
    }

    /// Fetch a reference from the remote source, falling back to a random local entry.
    pub async fn resolve(&self) -> String {
        let Some(remote) = self.remote.as_ref() else {
            return self.pick_fallback();
        };

        let outcome = match timeout(self.fetch_timeout, remote.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(ContentError::Timeout(self.fetch_timeout)),
        };

        match outcome {
            Ok(content_ref) => {
                debug!(%content_ref, "resolved remote content");
                content_ref
            }
            Err(err) => {
                warn!(error = %err, "remote content unavailable; using local pool");
                self.pick_fallback()
            }
        }
    }

    fn pick_fallback(&self) -> String {
        self.pool
            .choose(&mut rng())
            .cloned()
            .unwrap_or_else(|| LAST_RESORT_CONTENT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::{pending, ready};

    use super::*;

    struct FailingSource {
        calls: AtomicUsize,
    }

    impl ContentSource for FailingSource {
        fn fetch(&self) -> BoxFuture<'static, Result<String, ContentError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(ready(Err(ContentError::MissingUrl)))
        }
    }

    struct StalledSource;

    impl ContentSource for StalledSource {
        fn fetch(&self) -> BoxFuture<'static, Result<String, ContentError>> {
            Box::pin(pending())
        }
    }

    struct FixedSource(&'static str);

    impl ContentSource for FixedSource {
        fn fetch(&self) -> BoxFuture<'static, Result<String, ContentError>> {
            Box::pin(ready(Ok(self.0.to_string())))
        }
    }

    fn pool() -> Vec<String> {
        vec!["/memes/a.png".into(), "/memes/b.png".into()]
    }

    #[tokio::test]
    async fn failing_remote_falls_back_to_pool() {
        let source = Arc::new(FailingSource {
            calls: AtomicUsize::new(0),
        });
        let resolver = ContentResolver::new(Some(source.clone()), pool(), Duration::from_secs(1));

        for _ in 0..20 {
            let content_ref = resolver.resolve().await;
            assert!(!content_ref.is_empty());
            assert!(pool().contains(&content_ref));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_remote_times_out() {
        let resolver =
            ContentResolver::new(Some(Arc::new(StalledSource)), pool(), Duration::from_millis(50));
        let content_ref = resolver.resolve().await;
        assert!(pool().contains(&content_ref));
    }

    #[tokio::test]
    async fn remote_answer_is_preferred() {
        let resolver = ContentResolver::new(
            Some(Arc::new(FixedSource("https://i.example/meme.png"))),
            pool(),
            Duration::from_secs(1),
        );
        assert_eq!(resolver.resolve().await, "https://i.example/meme.png");
    }

    #[tokio::test]
    async fn empty_pool_still_yields_reference() {
        let resolver = ContentResolver::local(Vec::new());
        assert_eq!(resolver.resolve().await, LAST_RESORT_CONTENT);
        assert_eq!(resolver.bootstrap_ref(), LAST_RESORT_CONTENT);
    }

    #[test]
    fn bootstrap_uses_first_pool_entry() {
        assert_eq!(ContentResolver::local(pool()).bootstrap_ref(), "/memes/a.png");
    }
}
