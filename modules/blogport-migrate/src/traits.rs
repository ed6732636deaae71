// Trait abstractions for the migration's external collaborators.
//
// RecordSource: the legacy blog database (authors, posts, categories, media).
// ContentPlatform: the Contentful space entries and assets are written to.
// Reachability: "does this media URL still resolve?"
//
// The orchestrators only see these traits, so tests run against the in-memory
// mocks in `testing.rs`: no network, no database.

use anyhow::Result;
use async_trait::async_trait;

use contentful_client::{Asset, Collection, ContentfulClient, Entry, EntryQuery, Fields, NewAsset};

use crate::source::{AuthorRecord, CategoryTag, MediaRecord, PostRecord};

// ---------------------------------------------------------------------------
// RecordSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Authors with at least one post and no Contentful entry yet.
    async fn fetch_authors_without_destination_id(&self) -> Result<Vec<AuthorRecord>>;

    /// Authors already migrated to Contentful.
    async fn fetch_authors_with_destination_id(&self) -> Result<Vec<AuthorRecord>>;

    /// Remember the Contentful entry created for an author.
    async fn record_author_destination_id(&self, login: &str, entry_id: &str) -> Result<()>;

    /// Posts whose HTML has been converted to rich text, oldest first.
    async fn fetch_posts_with_richtext(&self) -> Result<Vec<PostRecord>>;

    async fn fetch_categories_for_post(&self, post_id: i64) -> Result<Vec<CategoryTag>>;

    /// Categories of the post published at a legacy permalink.
    async fn fetch_categories_for_link(&self, link: &str) -> Result<Vec<CategoryTag>>;

    /// Featured image of a post, if it has one.
    async fn fetch_hero_media(&self, post_id: i64) -> Result<Option<MediaRecord>>;
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Reachability: Send + Sync {
    /// `true` only for a successful response. Never errors.
    async fn exists(&self, url: &str) -> bool;
}

// ---------------------------------------------------------------------------
// ContentPlatform
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentPlatform: Send + Sync {
    /// Locale every field is written under.
    fn locale(&self) -> &str;

    // --- Entries ---

    /// One page of entries.
    async fn entries(&self, query: &EntryQuery) -> Result<Collection<Entry>>;

    async fn find_entry_by_slug(&self, content_type: &str, slug: &str) -> Result<Option<Entry>> {
        let query = EntryQuery::content_type(content_type)
            .field_eq("slug", slug)
            .limit(1);
        Ok(self.entries(&query).await?.items.into_iter().next())
    }

    async fn get_entry(&self, id: &str) -> Result<Entry>;

    async fn create_entry(&self, content_type: &str, fields: Fields) -> Result<Entry>;

    async fn update_entry(&self, entry: &Entry) -> Result<Entry>;

    async fn publish_entry(&self, entry: &Entry) -> Result<Entry>;

    // --- Assets ---

    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset>;

    /// Trigger processing and wait until the asset has a hosted file.
    async fn process_asset(&self, asset: &Asset) -> Result<Asset>;

    async fn get_asset(&self, id: &str) -> Result<Asset>;

    async fn publish_asset(&self, asset: &Asset) -> Result<Asset>;

    async fn unpublish_asset(&self, asset: &Asset) -> Result<Asset>;

    async fn archive_asset(&self, asset: &Asset) -> Result<Asset>;

    // --- Published view ---

    /// One page of published assets, oldest first.
    async fn published_assets(&self, skip: u64) -> Result<Collection<Asset>>;

    /// Published entries linking to an asset.
    async fn published_entries_linking_to(&self, asset_id: &str) -> Result<u64>;
}

#[async_trait]
impl ContentPlatform for ContentfulClient {
    fn locale(&self) -> &str {
        ContentfulClient::locale(self)
    }

    async fn entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        Ok(self.entries(query).await?)
    }

    async fn get_entry(&self, id: &str) -> Result<Entry> {
        Ok(self.get_entry(id).await?)
    }

    async fn create_entry(&self, content_type: &str, fields: Fields) -> Result<Entry> {
        Ok(self.create_entry(content_type, &fields).await?)
    }

    async fn update_entry(&self, entry: &Entry) -> Result<Entry> {
        Ok(self.update_entry(entry).await?)
    }

    async fn publish_entry(&self, entry: &Entry) -> Result<Entry> {
        Ok(self.publish_entry(entry).await?)
    }

    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        Ok(self.create_asset(asset).await?)
    }

    async fn process_asset(&self, asset: &Asset) -> Result<Asset> {
        self.process_asset(asset).await?;
        Ok(self.wait_for_asset(asset.id()).await?)
    }

    async fn get_asset(&self, id: &str) -> Result<Asset> {
        Ok(self.get_asset(id).await?)
    }

    async fn publish_asset(&self, asset: &Asset) -> Result<Asset> {
        Ok(self.publish_asset(asset).await?)
    }

    async fn unpublish_asset(&self, asset: &Asset) -> Result<Asset> {
        Ok(self.unpublish_asset(asset).await?)
    }

    async fn archive_asset(&self, asset: &Asset) -> Result<Asset> {
        Ok(self.archive_asset(asset).await?)
    }

    async fn published_assets(&self, skip: u64) -> Result<Collection<Asset>> {
        Ok(self.published_assets(skip).await?)
    }

    async fn published_entries_linking_to(&self, asset_id: &str) -> Result<u64> {
        Ok(self.published_entries_linking_to(asset_id).await?)
    }
}
