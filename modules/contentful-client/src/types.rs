use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Locale every field is written under unless the caller says otherwise.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Localized field map: `{ "title": { "en-US": "..." }, ... }`.
pub type Fields = Map<String, Value>;

// --- System metadata ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(
        rename = "publishedVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub published_version: Option<u64>,
    #[serde(rename = "archivedVersion", default, skip_serializing_if = "Option::is_none")]
    pub archived_version: Option<u64>,
}

impl Sys {
    /// Version header value for optimistic-locking writes. Delivery API
    /// payloads omit it, so fall back to 1.
    pub fn version(&self) -> u64 {
        self.version.unwrap_or(1)
    }
}

// --- Links ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSys {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "linkType")]
    pub link_type: String,
    pub id: String,
}

/// A `{ "sys": { "type": "Link", ... } }` reference to an entry or asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub sys: LinkSys,
}

impl Link {
    pub fn entry(id: impl Into<String>) -> Self {
        Self::new("Entry", id)
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self::new("Asset", id)
    }

    fn new(link_type: &str, id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                kind: "Link".to_string(),
                link_type: link_type.to_string(),
                id: id.into(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.sys.id
    }

    pub fn to_value(&self) -> Value {
        json!({
            "sys": {
                "type": self.sys.kind,
                "linkType": self.sys.link_type,
                "id": self.sys.id,
            }
        })
    }
}

// --- Entries and assets ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub sys: Sys,
    #[serde(default)]
    pub fields: Fields,
}

impl Entry {
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Read a localized field value.
    pub fn field(&self, name: &str, locale: &str) -> Option<&Value> {
        self.fields.get(name)?.get(locale)
    }

    /// Read a localized string field.
    pub fn field_str(&self, name: &str, locale: &str) -> Option<&str> {
        self.field(name, locale)?.as_str()
    }

    /// Overwrite a localized field, dropping values stored under other locales.
    pub fn set_field(&mut self, name: &str, locale: &str, value: Value) {
        let mut localized = Map::new();
        localized.insert(locale.to_string(), value);
        self.fields.insert(name.to_string(), Value::Object(localized));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub sys: Sys,
    #[serde(default)]
    pub fields: Fields,
}

impl Asset {
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Hosted file URL. Only present once processing has finished.
    pub fn file_url(&self, locale: &str) -> Option<&str> {
        self.fields.get("file")?.get(locale)?.get("url")?.as_str()
    }
}

/// Metadata for a new asset whose binary is fetched by Contentful from
/// `upload_url` during processing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub title: String,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub file_name: String,
    pub upload_url: String,
}

impl NewAsset {
    pub fn to_fields(&self, locale: &str) -> Value {
        let mut file = Map::new();
        if let Some(ref content_type) = self.content_type {
            file.insert("contentType".to_string(), json!(content_type));
        }
        file.insert("fileName".to_string(), json!(self.file_name));
        file.insert("upload".to_string(), json!(self.upload_url));

        let mut fields = Map::new();
        fields.insert("title".to_string(), json!({ locale: self.title }));
        if let Some(ref description) = self.description {
            fields.insert("description".to_string(), json!({ locale: description }));
        }
        fields.insert("file".to_string(), json!({ locale: Value::Object(file) }));
        Value::Object(fields)
    }
}

// --- Collections and queries ---

/// One page of a collection response.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

impl<T> Collection<T> {
    /// Offset of the following page, or `None` when this was the last one.
    pub fn next_skip(&self) -> Option<u64> {
        let next = self.skip + self.limit;
        (self.limit > 0 && next < self.total).then_some(next)
    }
}

/// Query parameters for the `/entries` collection endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryQuery {
    pub content_type: Option<String>,
    pub filters: Vec<(String, String)>,
    pub order: Option<String>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl EntryQuery {
    pub fn content_type(content_type: &str) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            ..Self::default()
        }
    }

    /// `fields.<name>=<value>` equality filter.
    pub fn field_eq(mut self, name: &str, value: &str) -> Self {
        self.filters
            .push((format!("fields.{name}"), value.to_string()));
        self
    }

    /// `fields.<name>[exists]=<bool>` filter.
    pub fn field_exists(mut self, name: &str, exists: bool) -> Self {
        self.filters
            .push((format!("fields.{name}[exists]"), exists.to_string()));
        self
    }

    pub fn links_to_asset(mut self, asset_id: &str) -> Self {
        self.filters
            .push(("links_to_asset".to_string(), asset_id.to_string()));
        self
    }

    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(ref content_type) = self.content_type {
            params.push(("content_type".to_string(), content_type.clone()));
        }
        params.extend(self.filters.iter().cloned());
        if let Some(ref order) = self.order {
            params.push(("order".to_string(), order.clone()));
        }
        params.push(("skip".to_string(), self.skip.to_string()));
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_serializes_to_contentful_shape() {
        let link = Link::asset("abc");
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({ "sys": { "type": "Link", "linkType": "Asset", "id": "abc" } })
        );
        assert_eq!(link.to_value(), serde_json::to_value(&link).unwrap());
    }

    #[test]
    fn new_asset_omits_unknown_content_type() {
        let asset = NewAsset {
            title: "Hero a-post".to_string(),
            description: Some("photo.gif".to_string()),
            content_type: None,
            file_name: "photo.gif".to_string(),
            upload_url: "http://example.com/photo.gif".to_string(),
        };

        let fields = asset.to_fields(DEFAULT_LOCALE);
        let file = &fields["file"]["en-US"];
        assert!(file.get("contentType").is_none());
        assert_eq!(file["upload"], "http://example.com/photo.gif");
        assert_eq!(fields["title"]["en-US"], "Hero a-post");
    }

    #[test]
    fn next_skip_stops_at_total() {
        let page: Collection<Entry> = serde_json::from_value(json!({
            "items": [], "total": 250, "skip": 200, "limit": 100
        }))
        .unwrap();
        assert_eq!(page.next_skip(), None);

        let page: Collection<Entry> = serde_json::from_value(json!({
            "items": [], "total": 250, "skip": 100, "limit": 100
        }))
        .unwrap();
        assert_eq!(page.next_skip(), Some(200));
    }

    #[test]
    fn entry_query_params_include_filters_in_order() {
        let query = EntryQuery::content_type("blogPost")
            .field_exists("categories", false)
            .order("sys.createdAt")
            .skip(100);

        assert_eq!(
            query.to_params(),
            vec![
                ("content_type".to_string(), "blogPost".to_string()),
                ("fields.categories[exists]".to_string(), "false".to_string()),
                ("order".to_string(), "sys.createdAt".to_string()),
                ("skip".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn entry_field_helpers_are_locale_aware() {
        let mut entry: Entry = serde_json::from_value(json!({
            "sys": { "id": "e1", "type": "Entry", "version": 3 },
            "fields": { "slug": { "en-US": "hello" } }
        }))
        .unwrap();

        assert_eq!(entry.field_str("slug", DEFAULT_LOCALE), Some("hello"));
        assert_eq!(entry.field_str("slug", "de-DE"), None);

        entry.set_field("slug", DEFAULT_LOCALE, json!("author/jane"));
        assert_eq!(entry.field_str("slug", DEFAULT_LOCALE), Some("author/jane"));
        assert_eq!(entry.sys.version(), 3);
    }
}
