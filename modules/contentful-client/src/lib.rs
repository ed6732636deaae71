pub mod error;
pub mod types;

pub use error::{ContentfulError, Result};
pub use types::{
    Asset, Collection, Entry, EntryQuery, Fields, Link, LinkSys, NewAsset, Sys, DEFAULT_LOCALE,
};

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

const MANAGEMENT_URL: &str = "https://api.contentful.com";
const DELIVERY_URL: &str = "https://cdn.contentful.com";

const MANAGEMENT_CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";

/// How many times to poll an asset for a hosted file URL after processing.
const PROCESSING_ATTEMPTS: u32 = 10;
const PROCESSING_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct ContentfulClient {
    client: reqwest::Client,
    management_url: String,
    delivery_url: String,
    space_id: String,
    environment: String,
    management_token: String,
    delivery_token: Option<String>,
    locale: String,
}

impl ContentfulClient {
    pub fn new(space_id: &str, environment: &str, management_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            management_url: MANAGEMENT_URL.to_string(),
            delivery_url: DELIVERY_URL.to_string(),
            space_id: space_id.to_string(),
            environment: environment.to_string(),
            management_token: management_token.to_string(),
            delivery_token: None,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Enable Delivery API reads (published content only).
    pub fn with_delivery_token(mut self, token: &str) -> Self {
        self.delivery_token = Some(token.to_string());
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    /// Point both APIs at different hosts (proxies, local fakes).
    pub fn with_base_urls(mut self, management_url: &str, delivery_url: &str) -> Self {
        self.management_url = management_url.trim_end_matches('/').to_string();
        self.delivery_url = delivery_url.trim_end_matches('/').to_string();
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn management(&self, path: &str) -> String {
        format!(
            "{}/spaces/{}/environments/{}{}",
            self.management_url, self.space_id, self.environment, path
        )
    }

    fn delivery(&self, path: &str) -> String {
        format!(
            "{}/spaces/{}/environments/{}{}",
            self.delivery_url, self.space_id, self.environment, path
        )
    }

    // --- Entries ---

    /// Fetch one page of entries matching `query`.
    pub async fn entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        let req = self
            .client
            .get(self.management("/entries"))
            .bearer_auth(&self.management_token)
            .query(&query.to_params());
        send(req).await
    }

    pub async fn get_entry(&self, id: &str) -> Result<Entry> {
        let req = self
            .client
            .get(self.management(&format!("/entries/{id}")))
            .bearer_auth(&self.management_token);
        send(req).await
    }

    pub async fn create_entry(&self, content_type: &str, fields: &Fields) -> Result<Entry> {
        tracing::debug!(content_type, "Creating entry");
        let req = self
            .client
            .post(self.management("/entries"))
            .bearer_auth(&self.management_token)
            .header("X-Contentful-Content-Type", content_type)
            .header(CONTENT_TYPE, MANAGEMENT_CONTENT_TYPE)
            .json(&json!({ "fields": fields }));
        send(req).await
    }

    /// Write the entry's current fields back. Fails with 409 if the entry
    /// changed since it was read.
    pub async fn update_entry(&self, entry: &Entry) -> Result<Entry> {
        let req = self
            .client
            .put(self.management(&format!("/entries/{}", entry.id())))
            .bearer_auth(&self.management_token)
            .header("X-Contentful-Version", entry.sys.version())
            .header(CONTENT_TYPE, MANAGEMENT_CONTENT_TYPE)
            .json(&json!({ "fields": entry.fields }));
        send(req).await
    }

    pub async fn publish_entry(&self, entry: &Entry) -> Result<Entry> {
        let req = self
            .client
            .put(self.management(&format!("/entries/{}/published", entry.id())))
            .bearer_auth(&self.management_token)
            .header("X-Contentful-Version", entry.sys.version());
        send(req).await
    }

    // --- Assets ---

    pub async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        tracing::debug!(file_name = %asset.file_name, "Creating asset");
        let req = self
            .client
            .post(self.management("/assets"))
            .bearer_auth(&self.management_token)
            .header(CONTENT_TYPE, MANAGEMENT_CONTENT_TYPE)
            .json(&json!({ "fields": asset.to_fields(&self.locale) }));
        send(req).await
    }

    /// Ask Contentful to fetch and process the asset's upload URL.
    /// Processing is asynchronous; see [`Self::wait_for_asset`].
    pub async fn process_asset(&self, asset: &Asset) -> Result<()> {
        let url = self.management(&format!(
            "/assets/{}/files/{}/process",
            asset.id(),
            self.locale
        ));
        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.management_token)
            .header("X-Contentful-Version", asset.sys.version())
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn get_asset(&self, id: &str) -> Result<Asset> {
        let req = self
            .client
            .get(self.management(&format!("/assets/{id}")))
            .bearer_auth(&self.management_token);
        send(req).await
    }

    /// Poll until processing has produced a hosted file URL.
    pub async fn wait_for_asset(&self, id: &str) -> Result<Asset> {
        for attempt in 1..=PROCESSING_ATTEMPTS {
            let asset = self.get_asset(id).await?;
            if asset.file_url(&self.locale).is_some() {
                return Ok(asset);
            }
            tracing::debug!(asset_id = id, attempt, "Asset still processing");
            tokio::time::sleep(PROCESSING_POLL_INTERVAL).await;
        }
        Err(ContentfulError::ProcessingTimeout(id.to_string()))
    }

    pub async fn publish_asset(&self, asset: &Asset) -> Result<Asset> {
        let req = self
            .client
            .put(self.management(&format!("/assets/{}/published", asset.id())))
            .bearer_auth(&self.management_token)
            .header("X-Contentful-Version", asset.sys.version());
        send(req).await
    }

    pub async fn unpublish_asset(&self, asset: &Asset) -> Result<Asset> {
        let req = self
            .client
            .delete(self.management(&format!("/assets/{}/published", asset.id())))
            .bearer_auth(&self.management_token)
            .header("X-Contentful-Version", asset.sys.version());
        send(req).await
    }

    pub async fn archive_asset(&self, asset: &Asset) -> Result<Asset> {
        let req = self
            .client
            .put(self.management(&format!("/assets/{}/archived", asset.id())))
            .bearer_auth(&self.management_token)
            .header("X-Contentful-Version", asset.sys.version());
        send(req).await
    }

    // --- Delivery API (published content only) ---

    /// One page of published assets, oldest first.
    pub async fn published_assets(&self, skip: u64) -> Result<Collection<Asset>> {
        let token = self
            .delivery_token
            .as_deref()
            .ok_or(ContentfulError::MissingDeliveryToken)?;
        let req = self
            .client
            .get(self.delivery("/assets"))
            .bearer_auth(token)
            .query(&[("order", "sys.createdAt".to_string()), ("skip", skip.to_string())]);
        send(req).await
    }

    /// Number of published entries linking to an asset. Draft entries are
    /// invisible to the Delivery API and are not counted.
    pub async fn published_entries_linking_to(&self, asset_id: &str) -> Result<u64> {
        let token = self
            .delivery_token
            .as_deref()
            .ok_or(ContentfulError::MissingDeliveryToken)?;
        let query = EntryQuery::default().links_to_asset(asset_id).limit(1);
        let req = self
            .client
            .get(self.delivery("/entries"))
            .bearer_auth(token)
            .query(&query.to_params());
        let page: Collection<Value> = send(req).await?;
        Ok(page.total)
    }
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = check(req.send().await?).await?;
    decode(&resp.bytes().await?)
}

/// Body-shape mismatches surface as `Parse`, transport failures as `Network`.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ContentfulError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_body_shape_is_a_parse_error() {
        let err = decode::<Entry>(br#"{ "fields": {} }"#).unwrap_err();
        assert!(matches!(err, ContentfulError::Parse(_)), "got {err:?}");

        let err = decode::<Entry>(b"<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ContentfulError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn collection_body_decodes() {
        let page: Collection<Value> =
            decode(br#"{ "items": [], "total": 3, "skip": 0, "limit": 1 }"#).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.next_skip(), Some(1));
    }
}
