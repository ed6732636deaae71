//! Cooperative throttle for Contentful calls.
//!
//! The Management API rate-limits per space. Every call made through
//! [`PacedPlatform`] first waits until at least the configured interval has
//! passed since the previous call. Rejections are not retried here.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use contentful_client::{Asset, Collection, Entry, EntryQuery, Fields, NewAsset};

use crate::traits::ContentPlatform;

/// Fixed-interval gate.
pub struct Pacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// A gate that never waits.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for our turn.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// A [`ContentPlatform`] whose every call passes through a [`Pacer`] first.
pub struct PacedPlatform<P> {
    inner: P,
    pacer: Pacer,
}

impl<P: ContentPlatform> PacedPlatform<P> {
    pub fn new(inner: P, pacer: Pacer) -> Self {
        Self { inner, pacer }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ContentPlatform> ContentPlatform for PacedPlatform<P> {
    fn locale(&self) -> &str {
        self.inner.locale()
    }

    async fn entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        self.pacer.wait().await;
        self.inner.entries(query).await
    }

    async fn get_entry(&self, id: &str) -> Result<Entry> {
        self.pacer.wait().await;
        self.inner.get_entry(id).await
    }

    async fn create_entry(&self, content_type: &str, fields: Fields) -> Result<Entry> {
        self.pacer.wait().await;
        self.inner.create_entry(content_type, fields).await
    }

    async fn update_entry(&self, entry: &Entry) -> Result<Entry> {
        self.pacer.wait().await;
        self.inner.update_entry(entry).await
    }

    async fn publish_entry(&self, entry: &Entry) -> Result<Entry> {
        self.pacer.wait().await;
        self.inner.publish_entry(entry).await
    }

    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        self.pacer.wait().await;
        self.inner.create_asset(asset).await
    }

    async fn process_asset(&self, asset: &Asset) -> Result<Asset> {
        self.pacer.wait().await;
        self.inner.process_asset(asset).await
    }

    async fn get_asset(&self, id: &str) -> Result<Asset> {
        self.pacer.wait().await;
        self.inner.get_asset(id).await
    }

    async fn publish_asset(&self, asset: &Asset) -> Result<Asset> {
        self.pacer.wait().await;
        self.inner.publish_asset(asset).await
    }

    async fn unpublish_asset(&self, asset: &Asset) -> Result<Asset> {
        self.pacer.wait().await;
        self.inner.unpublish_asset(asset).await
    }

    async fn archive_asset(&self, asset: &Asset) -> Result<Asset> {
        self.pacer.wait().await;
        self.inner.archive_asset(asset).await
    }

    async fn published_assets(&self, skip: u64) -> Result<Collection<Asset>> {
        self.pacer.wait().await;
        self.inner.published_assets(skip).await
    }

    async fn published_entries_linking_to(&self, asset_id: &str) -> Result<u64> {
        self.pacer.wait().await;
        self.inner.published_entries_linking_to(asset_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn consecutive_waits_are_spaced_by_the_interval() {
        let pacer = Pacer::new(Duration::from_millis(500));
        let start = Instant::now();

        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn first_wait_is_immediate() {
        let pacer = Pacer::new(Duration::from_secs(5));
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn unthrottled_pacer_never_sleeps() {
        let pacer = Pacer::unthrottled();
        for _ in 0..100 {
            pacer.wait().await;
        }
        assert!(pacer.interval().is_zero());
    }
}
