//! Blog categories: the fixed set created up front, and lookup by name.

use anyhow::Result;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use blogport_common::MigrateError;
use contentful_client::{Entry, EntryQuery, Fields, Link};

use crate::paging::all_entries;
use crate::source::CategoryTag;
use crate::traits::ContentPlatform;

pub const BLOG_CATEGORY: &str = "blogCategory";

/// `(slug, name)` of every category on the legacy blog.
pub const CATEGORIES: [(&str, &str); 10] = [
    ("case-studies", "Case Studies"),
    ("client-stories", "Client Stories"),
    ("employer-branding", "Employer Branding"),
    ("facebook-recruiting", "Facebook Recruiting"),
    ("link-love", "Link Love"),
    ("product-updates", "Product Updates"),
    ("resources", "Resources"),
    ("social-recruiting", "Social Recruiting"),
    ("welcome-to-jobcast", "Welcome to Jobcast"),
    ("white-papers", "White Papers"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl Category {
    fn from_entry(entry: &Entry, locale: &str) -> Self {
        Self {
            id: entry.id().to_string(),
            name: entry.field_str("name", locale).unwrap_or_default().to_string(),
            slug: entry.field_str("slug", locale).unwrap_or_default().to_string(),
        }
    }
}

/// All categories in the space.
pub async fn load_categories(platform: &dyn ContentPlatform) -> Result<Vec<Category>> {
    let entries = all_entries(
        platform,
        EntryQuery::content_type(BLOG_CATEGORY).order("sys.createdAt"),
    )
    .await?;
    let locale = platform.locale();
    Ok(entries
        .iter()
        .map(|entry| Category::from_entry(entry, locale))
        .collect())
}

/// Links to the categories named by `tags`. Names with no matching category
/// are dropped with a warning.
pub fn category_links(tags: &[CategoryTag], categories: &[Category], slug: &str) -> Vec<Value> {
    tags.iter()
        .filter_map(|tag| {
            match categories.iter().find(|c| c.name == tag.value) {
                Some(category) => Some(Link::entry(&category.id).to_value()),
                None => {
                    warn!(slug, category = %tag.value, "Unknown category, skipping");
                    None
                }
            }
        })
        .collect()
}

/// Create and publish every category whose slug is not in the space yet.
/// Returns the number created.
pub async fn create_categories(platform: &dyn ContentPlatform) -> Result<usize, MigrateError> {
    let locale = platform.locale().to_string();
    let mut created = 0;

    for (slug, name) in CATEGORIES {
        let existing = platform
            .find_entry_by_slug(BLOG_CATEGORY, slug)
            .await
            .map_err(MigrateError::Platform)?;
        if existing.is_some() {
            info!(slug, "Category already exists - skipping");
            continue;
        }

        let mut fields = Fields::new();
        fields.insert("slug".to_string(), json!({ &locale: slug }));
        fields.insert("name".to_string(), json!({ &locale: name }));

        let result = async {
            let entry = platform.create_entry(BLOG_CATEGORY, fields).await?;
            platform.publish_entry(&entry).await
        }
        .await;

        match result {
            Ok(entry) => {
                info!(slug, entry_id = %entry.sys.id, "Category created");
                created += 1;
            }
            Err(e) => error!(slug, error = %e, "Failed to create category"),
        }
    }

    Ok(created)
}
