#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use krait_auth::{Credential, CredentialCache, TokenSource};
use krait_core::{Error, Result};

/// Counts fetches and hands out sequentially numbered tokens.
struct CountingSource {
    hits: AtomicUsize,
    delay: Duration,
    ttl: Duration,
}

impl CountingSource {
    fn new(ttl: Duration) -> Self {
        Self { hits: AtomicUsize::new(0), delay: Duration::from_millis(20), ttl }
    }
}

#[async_trait::async_trait]
impl TokenSource for CountingSource {
    async fn fetch(&self) -> Result<Credential> {
        let hit = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
        // Widen the refresh window so concurrent readers pile up behind it.
        tokio::time::sleep(self.delay).await;
        Ok(Credential::expiring_in(format!("t-{hit}"), self.ttl))
    }
}

/// Fails once, then produces tokens.
struct FlakySource {
    hits: AtomicUsize,
}

#[async_trait::async_trait]
impl TokenSource for FlakySource {
    async fn fetch(&self) -> Result<Credential> {
        let hit = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
        if hit == 1 {
            return Err(Error::CredentialRefresh("source offline".into()));
        }
        Ok(Credential::expiring_in(format!("t-{hit}"), Duration::from_secs(3600)))
    }
}

#[tokio::test]
async fn concurrent_readers_trigger_exactly_one_refresh() {
    let source = Arc::new(CountingSource::new(Duration::from_secs(3600)));
    let cache = Arc::new(CredentialCache::new(SharedSource(source.clone())));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move { cache.header_value().await.unwrap() }));
    }
    let mut values = Vec::new();
    for task in tasks {
        values.push(task.await.unwrap());
    }

    assert_eq!(source.hits.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| v == "Bearer t-1"), "all readers see the refreshed value");
}

#[tokio::test]
async fn valid_token_is_served_without_refreshing() {
    let source = Arc::new(CountingSource::new(Duration::from_secs(3600)));
    let cache = CredentialCache::new(SharedSource(source.clone()));

    assert_eq!(cache.header_value().await.unwrap(), "Bearer t-1");
    assert_eq!(cache.header_value().await.unwrap(), "Bearer t-1");
    assert_eq!(source.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn token_inside_the_lookahead_window_is_refreshed() {
    // Expires in 5s, which is inside the 10s lookahead: always stale.
    let source = Arc::new(CountingSource::new(Duration::from_secs(5)));
    let cache = CredentialCache::new(SharedSource(source.clone()));

    assert_eq!(cache.header_value().await.unwrap(), "Bearer t-1");
    assert_eq!(cache.header_value().await.unwrap(), "Bearer t-2");
    assert_eq!(source.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_refresh_stays_stale_and_retries() {
    let source = Arc::new(FlakySource { hits: AtomicUsize::new(0) });
    let cache = CredentialCache::new(SharedSource(source.clone()));

    let err = cache.header_value().await.unwrap_err();
    assert!(matches!(err, Error::CredentialRefresh(_)));
    // Next attempt hits the source again and succeeds.
    assert_eq!(cache.header_value().await.unwrap(), "Bearer t-2");
    assert_eq!(source.hits.load(Ordering::SeqCst), 2);
}

/// Arc adapter so tests can keep a handle on the source.
struct SharedSource<S>(Arc<S>);

#[async_trait::async_trait]
impl<S: TokenSource> TokenSource for SharedSource<S> {
    async fn fetch(&self) -> Result<Credential> {
        self.0.fetch().await
    }
}
