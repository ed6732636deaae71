use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::traits::Reachability;

/// Checks media URLs with a plain GET, following redirects.
pub struct HttpReachability {
    client: reqwest::Client,
}

impl HttpReachability {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Reachability for HttpReachability {
    async fn exists(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(url, error = %e, "Media URL unreachable");
                false
            }
        }
    }
}
