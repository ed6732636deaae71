// Test mocks for the migration.
//
// Three mocks matching the three trait boundaries:
// - MockRecordSource (RecordSource): in-memory legacy tables
// - MockPlatform (ContentPlatform): stateful in-memory Contentful space
// - MockReachability (Reachability): set of URLs that "exist"
//
// Plus helpers for building post records and rich-text fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use contentful_client::{
    Asset, Collection, Entry, EntryQuery, Fields, NewAsset, Sys, DEFAULT_LOCALE,
};

use crate::source::{AuthorRecord, CategoryTag, MediaRecord, PostRecord};
use crate::traits::{ContentPlatform, Reachability, RecordSource};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

pub const SITE: &str = "http://www.jobcast.net/";
pub const AUTHOR_ENTRY_ID: &str = "author-entry-1";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A post by `jane` at `SITE/<slug>/` with the given stored rich text.
pub fn post(id: i64, slug: &str, rich_text: Value) -> PostRecord {
    PostRecord {
        id,
        author_contentful_id: Some(AUTHOR_ENTRY_ID.to_string()),
        title: format!("Post {id}"),
        link: format!("{SITE}{slug}/"),
        pub_date: Utc.with_ymd_and_hms(2014, 5, id as u32 % 28 + 1, 9, 0, 0).single(),
        creator: "jane".to_string(),
        rich_text: rich_text.to_string(),
    }
}

/// A one-paragraph document.
pub fn simple_body(text: &str) -> Value {
    json!({
        "nodeType": "document",
        "data": {},
        "content": [{ "content": [{ "nodeType": "text", "value": text }] }]
    })
}

/// An embedded asset described inline by the HTML converter.
pub fn asset_descriptor(url: &str) -> Value {
    let file_name = url.rsplit('/').next().unwrap_or(url);
    json!({
        "nodeType": "embedded-asset-block",
        "data": {
            "target": {
                "sys": { "type": "Asset" },
                "fields": {
                    "title": file_name,
                    "description": format!("Image {file_name}"),
                    "file": { "url": url, "fileName": file_name, "contentType": "image/png" }
                }
            }
        },
        "content": []
    })
}

// ---------------------------------------------------------------------------
// MockRecordSource
// ---------------------------------------------------------------------------

/// In-memory legacy database. Builder pattern: `.with_post()`,
/// `.with_categories()`, `.with_hero()`, `.with_author()`.
pub struct MockRecordSource {
    authors: Mutex<Vec<AuthorRecord>>,
    posts: Vec<PostRecord>,
    categories: HashMap<i64, Vec<CategoryTag>>,
    heroes: HashMap<i64, MediaRecord>,
    fail_fetches: bool,
}

impl Default for MockRecordSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecordSource {
    pub fn new() -> Self {
        Self {
            authors: Mutex::new(Vec::new()),
            posts: Vec::new(),
            categories: HashMap::new(),
            heroes: HashMap::new(),
            fail_fetches: false,
        }
    }

    pub fn with_author(self, login: &str, contentful_id: Option<&str>) -> Self {
        {
            let mut authors = self.authors.lock().unwrap();
            let id = authors.len() as i64 + 1;
            authors.push(AuthorRecord {
                id,
                login: login.to_string(),
                email: Some(format!("{}@jobcast.net", login.to_lowercase())),
                name: Some(login.to_string()),
                contentful_id: contentful_id.map(String::from),
            });
        }
        self
    }

    pub fn with_post(mut self, post: PostRecord) -> Self {
        self.posts.push(post);
        self
    }

    pub fn with_categories(mut self, post_id: i64, names: &[&str]) -> Self {
        let tags = names
            .iter()
            .map(|name| CategoryTag {
                post_id,
                domain: "category".to_string(),
                value: name.to_string(),
            })
            .collect();
        self.categories.insert(post_id, tags);
        self
    }

    pub fn with_hero(mut self, post_id: i64, url: &str) -> Self {
        self.heroes.insert(
            post_id,
            MediaRecord {
                post_id: post_id + 1000,
                post_parent: post_id,
                link: None,
                title: None,
                post_type: Some("attachment".to_string()),
                attachment_url: url.to_string(),
            },
        );
        self
    }

    /// Every read fails, as if the database were down.
    pub fn failing_fetches(mut self) -> Self {
        self.fail_fetches = true;
        self
    }

    pub fn author(&self, login: &str) -> Option<AuthorRecord> {
        self.authors
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.login == login)
            .cloned()
    }

    fn check(&self) -> Result<()> {
        if self.fail_fetches {
            bail!("connection refused");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch_authors_without_destination_id(&self) -> Result<Vec<AuthorRecord>> {
        self.check()?;
        Ok(self
            .authors
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.contentful_id.is_none())
            .filter(|a| self.posts.iter().any(|p| p.creator == a.login))
            .cloned()
            .collect())
    }

    async fn fetch_authors_with_destination_id(&self) -> Result<Vec<AuthorRecord>> {
        self.check()?;
        Ok(self
            .authors
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.contentful_id.is_some())
            .cloned()
            .collect())
    }

    async fn record_author_destination_id(&self, login: &str, entry_id: &str) -> Result<()> {
        self.check()?;
        let mut authors = self.authors.lock().unwrap();
        let author = authors
            .iter_mut()
            .find(|a| a.login == login)
            .ok_or_else(|| anyhow!("no author {login}"))?;
        author.contentful_id = Some(entry_id.to_string());
        Ok(())
    }

    async fn fetch_posts_with_richtext(&self) -> Result<Vec<PostRecord>> {
        self.check()?;
        Ok(self.posts.clone())
    }

    async fn fetch_categories_for_post(&self, post_id: i64) -> Result<Vec<CategoryTag>> {
        self.check()?;
        Ok(self.categories.get(&post_id).cloned().unwrap_or_default())
    }

    async fn fetch_categories_for_link(&self, link: &str) -> Result<Vec<CategoryTag>> {
        self.check()?;
        Ok(self
            .posts
            .iter()
            .find(|p| p.link == link)
            .and_then(|p| self.categories.get(&p.id).cloned())
            .unwrap_or_default())
    }

    async fn fetch_hero_media(&self, post_id: i64) -> Result<Option<MediaRecord>> {
        self.check()?;
        Ok(self.heroes.get(&post_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MockReachability
// ---------------------------------------------------------------------------

/// URLs registered with `.reachable()` exist; everything else does not.
/// Every check is recorded.
pub struct MockReachability {
    reachable: HashSet<String>,
    checked: Mutex<Vec<String>>,
}

impl Default for MockReachability {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReachability {
    pub fn new() -> Self {
        Self {
            reachable: HashSet::new(),
            checked: Mutex::new(Vec::new()),
        }
    }

    pub fn reachable(mut self, url: &str) -> Self {
        self.reachable.insert(url.to_string());
        self
    }

    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reachability for MockReachability {
    async fn exists(&self, url: &str) -> bool {
        self.checked.lock().unwrap().push(url.to_string());
        self.reachable.contains(url)
    }
}

// ---------------------------------------------------------------------------
// MockPlatform
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SpaceState {
    next_id: u64,
    entries: Vec<(String, Entry)>,
    assets: Vec<Asset>,
    calls: Vec<String>,
}

impl SpaceState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut Entry> {
        self.entries
            .iter_mut()
            .map(|(_, e)| e)
            .find(|e| e.sys.id == id)
            .ok_or_else(|| anyhow!("404 entry {id} not found"))
    }

    fn asset_mut(&mut self, id: &str) -> Result<&mut Asset> {
        self.assets
            .iter_mut()
            .find(|a| a.sys.id == id)
            .ok_or_else(|| anyhow!("404 asset {id} not found"))
    }
}

/// Stateful in-memory Contentful space. Collections are served in pages of
/// `page_size` so callers' cursor loops get exercised.
pub struct MockPlatform {
    state: Mutex<SpaceState>,
    page_size: u64,
    failing_slugs: HashSet<String>,
    fail_assets: bool,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SpaceState::default()),
            page_size: 2,
            failing_slugs: HashSet::new(),
            fail_assets: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Creating an entry with this slug fails validation.
    pub fn failing_create_for(mut self, slug: &str) -> Self {
        self.failing_slugs.insert(slug.to_string());
        self
    }

    /// Every asset creation is rejected.
    pub fn failing_asset_uploads(mut self) -> Self {
        self.fail_assets = true;
        self
    }

    /// Seed a published entry. `fields` are plain values, localized here.
    pub fn with_entry(self, content_type: &str, fields: Value) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id("seed");
            let fields = localize(fields);
            state.entries.push((
                content_type.to_string(),
                Entry {
                    sys: sys(&id, "Entry", Some(2)),
                    fields,
                },
            ));
        }
        self
    }

    /// Seed a published asset.
    pub fn with_published_asset(self, id: &str) -> Self {
        self.state.lock().unwrap().assets.push(Asset {
            sys: sys(id, "Asset", Some(2)),
            fields: Fields::new(),
        });
        self
    }

    pub fn entries_of(&self, content_type: &str) -> Vec<Entry> {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|(ct, _)| ct == content_type)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn entry_by_slug(&self, content_type: &str, slug: &str) -> Option<Entry> {
        self.entries_of(content_type)
            .into_iter()
            .find(|e| e.field_str("slug", DEFAULT_LOCALE) == Some(slug))
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.state.lock().unwrap().assets.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn page<T: Clone>(&self, items: Vec<T>, skip: u64, limit: Option<u64>) -> Collection<T> {
        let limit = limit.unwrap_or(self.page_size);
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect();
        Collection {
            items,
            total,
            skip,
            limit,
        }
    }
}

fn sys(id: &str, kind: &str, published_version: Option<u64>) -> Sys {
    Sys {
        id: id.to_string(),
        kind: kind.to_string(),
        version: Some(published_version.map_or(1, |v| v + 1)),
        published_version,
        archived_version: None,
    }
}

fn localize(fields: Value) -> Fields {
    match fields {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| (k, json!({ DEFAULT_LOCALE: v })))
            .collect(),
        _ => Fields::new(),
    }
}

fn matches_query(entry: &Entry, query: &EntryQuery) -> bool {
    query.filters.iter().all(|(key, value)| {
        let Some(field) = key.strip_prefix("fields.") else {
            return true;
        };
        match field.strip_suffix("[exists]") {
            Some(name) => entry.fields.contains_key(name) == (value == "true"),
            None => entry.field_str(field, DEFAULT_LOCALE) == Some(value.as_str()),
        }
    })
}

#[async_trait]
impl ContentPlatform for MockPlatform {
    fn locale(&self) -> &str {
        DEFAULT_LOCALE
    }

    async fn entries(&self, query: &EntryQuery) -> Result<Collection<Entry>> {
        self.record(format!(
            "entries {} skip={}",
            query.content_type.as_deref().unwrap_or("*"),
            query.skip
        ));
        let matching: Vec<Entry> = {
            let state = self.state.lock().unwrap();
            state
                .entries
                .iter()
                .filter(|(ct, _)| query.content_type.as_deref().map_or(true, |q| q == ct))
                .filter(|(_, e)| matches_query(e, query))
                .map(|(_, e)| e.clone())
                .collect()
        };
        Ok(self.page(matching, query.skip, query.limit))
    }

    async fn get_entry(&self, id: &str) -> Result<Entry> {
        self.record(format!("get_entry {id}"));
        let mut state = self.state.lock().unwrap();
        Ok(state.entry_mut(id)?.clone())
    }

    async fn create_entry(&self, content_type: &str, fields: Fields) -> Result<Entry> {
        let slug = fields
            .get("slug")
            .and_then(|s| s.get(DEFAULT_LOCALE))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.record(format!("create_entry {content_type} {slug}"));
        if self.failing_slugs.contains(&slug) {
            bail!("API error (status 422): validation failed for {slug}");
        }

        let mut state = self.state.lock().unwrap();
        let id = state.next_id("entry");
        let entry = Entry {
            sys: sys(&id, "Entry", None),
            fields,
        };
        state
            .entries
            .push((content_type.to_string(), entry.clone()));
        Ok(entry)
    }

    async fn update_entry(&self, entry: &Entry) -> Result<Entry> {
        self.record(format!("update_entry {}", entry.sys.id));
        let mut state = self.state.lock().unwrap();
        let stored = state.entry_mut(&entry.sys.id)?;
        if stored.sys.version != entry.sys.version {
            bail!("API error (status 409): version mismatch");
        }
        stored.fields = entry.fields.clone();
        stored.sys.version = Some(stored.sys.version() + 1);
        Ok(stored.clone())
    }

    async fn publish_entry(&self, entry: &Entry) -> Result<Entry> {
        self.record(format!("publish_entry {}", entry.sys.id));
        let mut state = self.state.lock().unwrap();
        let stored = state.entry_mut(&entry.sys.id)?;
        stored.sys.published_version = stored.sys.version;
        stored.sys.version = Some(stored.sys.version() + 1);
        Ok(stored.clone())
    }

    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        self.record(format!("create_asset {}", asset.upload_url));
        if self.fail_assets {
            bail!("API error (status 422): asset rejected");
        }
        let fields = match asset.to_fields(DEFAULT_LOCALE) {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("asset");
        let created = Asset {
            sys: sys(&id, "Asset", None),
            fields,
        };
        state.assets.push(created.clone());
        Ok(created)
    }

    async fn process_asset(&self, asset: &Asset) -> Result<Asset> {
        self.record(format!("process_asset {}", asset.sys.id));
        let mut state = self.state.lock().unwrap();
        let stored = state.asset_mut(&asset.sys.id)?;
        let file = stored
            .fields
            .get_mut("file")
            .and_then(|f| f.get_mut(DEFAULT_LOCALE))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| anyhow!("asset {} has no file", asset.sys.id))?;
        let upload = file.get("upload").cloned().unwrap_or(Value::Null);
        file.insert("url".to_string(), upload);
        stored.sys.version = Some(stored.sys.version() + 1);
        Ok(stored.clone())
    }

    async fn get_asset(&self, id: &str) -> Result<Asset> {
        self.record(format!("get_asset {id}"));
        let mut state = self.state.lock().unwrap();
        Ok(state.asset_mut(id)?.clone())
    }

    async fn publish_asset(&self, asset: &Asset) -> Result<Asset> {
        self.record(format!("publish_asset {}", asset.sys.id));
        let mut state = self.state.lock().unwrap();
        let stored = state.asset_mut(&asset.sys.id)?;
        stored.sys.published_version = stored.sys.version;
        stored.sys.version = Some(stored.sys.version() + 1);
        Ok(stored.clone())
    }

    async fn unpublish_asset(&self, asset: &Asset) -> Result<Asset> {
        self.record(format!("unpublish_asset {}", asset.sys.id));
        let mut state = self.state.lock().unwrap();
        let stored = state.asset_mut(&asset.sys.id)?;
        stored.sys.published_version = None;
        stored.sys.version = Some(stored.sys.version() + 1);
        Ok(stored.clone())
    }

    async fn archive_asset(&self, asset: &Asset) -> Result<Asset> {
        self.record(format!("archive_asset {}", asset.sys.id));
        let mut state = self.state.lock().unwrap();
        let stored = state.asset_mut(&asset.sys.id)?;
        if stored.sys.published_version.is_some() {
            bail!("API error (status 400): cannot archive a published asset");
        }
        stored.sys.archived_version = stored.sys.version;
        stored.sys.version = Some(stored.sys.version() + 1);
        Ok(stored.clone())
    }

    async fn published_assets(&self, skip: u64) -> Result<Collection<Asset>> {
        self.record(format!("published_assets skip={skip}"));
        let published: Vec<Asset> = self
            .state
            .lock()
            .unwrap()
            .assets
            .iter()
            .filter(|a| a.sys.published_version.is_some())
            .cloned()
            .collect();
        Ok(self.page(published, skip, None))
    }

    async fn published_entries_linking_to(&self, asset_id: &str) -> Result<u64> {
        self.record(format!("published_entries_linking_to {asset_id}"));
        let needle = format!("\"{asset_id}\"");
        let state = self.state.lock().unwrap();
        let count = state
            .entries
            .iter()
            .filter(|(_, e)| e.sys.published_version.is_some())
            .filter(|(_, e)| Value::Object(e.fields.clone()).to_string().contains(&needle))
            .count();
        Ok(count as u64)
    }
}
