//! Blog post migration.
//!
//! Posts are processed one at a time, oldest first. Each post's lifecycle
//! (existence check, body normalization, asset uploads, entry creation,
//! publish) finishes before the next post starts: Contentful's slug check
//! and entry creation are not transactional, and the space is rate limited.

use std::fmt;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use blogport_common::MigrateError;
use blogport_richtext::{normalize_document, parse_document, Node, RichTextError};
use contentful_client::{Entry, EntryQuery, Fields, Link};

use crate::assets::AssetResolver;
use crate::categories::{category_links, load_categories, Category};
use crate::paging::all_entries;
use crate::relink::relink_assets;
use crate::source::PostRecord;
use crate::traits::{ContentPlatform, RecordSource};

pub const BLOG_POST: &str = "blogPost";

/// Contentful slug for a legacy permalink: the site prefix and one trailing
/// slash removed.
pub fn post_slug(link: &str, legacy_site_url: &str) -> String {
    let path = link.replacen(legacy_site_url, "", 1);
    path.strip_suffix('/').unwrap_or(&path).to_string()
}

/// Legacy permalink for a Contentful slug.
pub fn legacy_link(slug: &str, legacy_site_url: &str) -> String {
    format!("{legacy_site_url}{slug}/")
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostRunStats {
    pub created: usize,
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
    pub assets_uploaded: usize,
    pub asset_placeholders: usize,
}

impl fmt::Display for PostRunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} published={} skipped={} failed={} assets_uploaded={} asset_placeholders={}",
            self.created,
            self.published,
            self.skipped,
            self.failed,
            self.assets_uploaded,
            self.asset_placeholders
        )
    }
}

enum PostOutcome {
    Skipped,
    Created { published: bool },
}

pub struct PostMigration<'a> {
    source: &'a dyn RecordSource,
    platform: &'a dyn ContentPlatform,
    resolver: AssetResolver<'a>,
    legacy_site_url: String,
    default_hero_asset_id: String,
}

impl<'a> PostMigration<'a> {
    pub fn new(
        source: &'a dyn RecordSource,
        platform: &'a dyn ContentPlatform,
        resolver: AssetResolver<'a>,
        legacy_site_url: &str,
        default_hero_asset_id: &str,
    ) -> Self {
        Self {
            source,
            platform,
            resolver,
            legacy_site_url: legacy_site_url.to_string(),
            default_hero_asset_id: default_hero_asset_id.to_string(),
        }
    }

    /// Create a `blogPost` entry for every converted post not yet in the space.
    ///
    /// With `as_draft` the body is left out and entries stay unpublished; this
    /// is for resubmitting posts whose body failed validation the first time.
    pub async fn send_posts(&self, as_draft: bool) -> Result<PostRunStats, MigrateError> {
        let categories = load_categories(self.platform)
            .await
            .map_err(MigrateError::Fetch)?;
        let posts = self
            .source
            .fetch_posts_with_richtext()
            .await
            .map_err(MigrateError::Fetch)?;
        info!(count = posts.len(), as_draft, "Fetched posts");

        let mut stats = PostRunStats::default();
        for post in &posts {
            let slug = post_slug(&post.link, &self.legacy_site_url);

            match self.send_post(post, &slug, &categories, as_draft, &mut stats).await {
                Ok(PostOutcome::Skipped) => stats.skipped += 1,
                Ok(PostOutcome::Created { published }) => {
                    stats.created += 1;
                    if published {
                        stats.published += 1;
                    }
                }
                Err(MigrateError::Fetch(e)) => return Err(MigrateError::Fetch(e)),
                Err(e) => {
                    error!(slug = %slug, error = %e, "***ERROR*** Error saving blog");
                    stats.failed += 1;
                }
            }
        }

        info!("Post migration complete. {stats}");
        Ok(stats)
    }

    async fn send_post(
        &self,
        post: &PostRecord,
        slug: &str,
        categories: &[Category],
        as_draft: bool,
        stats: &mut PostRunStats,
    ) -> Result<PostOutcome, MigrateError> {
        info!(slug, "Processing");

        let existing = self
            .platform
            .find_entry_by_slug(BLOG_POST, slug)
            .await
            .map_err(MigrateError::Platform)?;
        if existing.is_some() {
            info!(slug, "Already exists - skipping");
            return Ok(PostOutcome::Skipped);
        }

        let tags = self
            .source
            .fetch_categories_for_post(post.id)
            .await
            .map_err(MigrateError::Fetch)?;

        let locale = self.platform.locale();
        let mut fields = Fields::new();
        fields.insert("title".to_string(), localized(locale, json!(post.title)));
        fields.insert("slug".to_string(), localized(locale, json!(slug)));
        match post.author_contentful_id {
            Some(ref author_id) => {
                fields.insert(
                    "author".to_string(),
                    localized(locale, Link::entry(author_id).to_value()),
                );
            }
            None => warn!(slug, creator = %post.creator, "Author has no Contentful entry"),
        }
        if let Some(pub_date) = post.pub_date {
            fields.insert(
                "publishDate".to_string(),
                localized(locale, json!(pub_date.to_rfc3339())),
            );
        }
        fields.insert(
            "categories".to_string(),
            localized(locale, Value::Array(category_links(&tags, categories, slug))),
        );

        if !as_draft {
            let body = self.build_body(post, slug, stats).await?;
            let body = serde_json::to_value(&body).map_err(RichTextError::from)?;
            fields.insert("body".to_string(), localized(locale, body));
        }

        let media = self
            .source
            .fetch_hero_media(post.id)
            .await
            .map_err(MigrateError::Fetch)?;
        let hero_id = match self.resolver.upload_hero(media.as_ref(), slug).await {
            Some(hero) => hero.sys.id,
            None => self.default_hero_asset_id.clone(),
        };
        fields.insert(
            "heroImage".to_string(),
            localized(locale, Link::asset(hero_id).to_value()),
        );

        info!(slug, "Saving blog");
        let entry = self
            .platform
            .create_entry(BLOG_POST, fields)
            .await
            .map_err(MigrateError::Platform)?;

        if as_draft {
            info!(slug, entry_id = %entry.sys.id, "Blog saved as draft");
            return Ok(PostOutcome::Created { published: false });
        }

        info!(slug, "Publishing blog");
        self.platform
            .publish_entry(&entry)
            .await
            .map_err(MigrateError::Platform)?;
        info!(slug, entry_id = %entry.sys.id, "Blog publish complete");
        Ok(PostOutcome::Created { published: true })
    }

    /// Parse, normalize and relink a post's stored rich text.
    async fn build_body(
        &self,
        post: &PostRecord,
        slug: &str,
        stats: &mut PostRunStats,
    ) -> Result<Node, MigrateError> {
        let mut body = normalize_document(parse_document(&post.rich_text)?)?;

        let report = relink_assets(std::slice::from_mut(&mut body), &self.resolver, slug).await;
        stats.assets_uploaded += report.uploaded;
        stats.asset_placeholders += report.placeholders;
        if report != Default::default() {
            info!(slug, "Body assets: {report}");
        }

        Ok(body)
    }
}

fn localized(locale: &str, value: Value) -> Value {
    json!({ locale: value })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryUpdateStats {
    pub updated: usize,
    pub without_categories: usize,
    pub failed: usize,
}

/// Attach categories to `blogPost` entries created without any, looking them
/// up in the legacy database by permalink.
pub async fn update_posts_without_categories(
    source: &dyn RecordSource,
    platform: &dyn ContentPlatform,
    legacy_site_url: &str,
) -> Result<CategoryUpdateStats, MigrateError> {
    let categories = load_categories(platform)
        .await
        .map_err(MigrateError::Fetch)?;
    // Collect every page before updating: updated posts drop out of the filter
    // and would shift the remaining pages.
    let posts = all_entries(
        platform,
        EntryQuery::content_type(BLOG_POST)
            .field_exists("categories", false)
            .order("sys.createdAt"),
    )
    .await
    .map_err(MigrateError::Fetch)?;
    info!(count = posts.len(), "Fetched posts without categories");

    let locale = platform.locale().to_string();
    let mut stats = CategoryUpdateStats::default();

    for mut post in posts {
        let Some(slug) = post.field_str("slug", &locale).map(String::from) else {
            warn!(entry_id = %post.sys.id, "Post has no slug - skipping");
            continue;
        };

        let tags = source
            .fetch_categories_for_link(&legacy_link(&slug, legacy_site_url))
            .await
            .map_err(MigrateError::Fetch)?;
        if tags.is_empty() {
            info!(slug = %slug, "No categories");
            stats.without_categories += 1;
            continue;
        }

        post.set_field(
            "categories",
            &locale,
            Value::Array(category_links(&tags, &categories, &slug)),
        );

        let result = async {
            let updated = platform.update_entry(&post).await?;
            platform.publish_entry(&updated).await
        }
        .await;

        match result {
            Ok(_) => {
                let names: Vec<&str> = tags.iter().map(|t| t.value.as_str()).collect();
                info!(slug = %slug, "Set categories to: {}", names.join(" | "));
                stats.updated += 1;
            }
            Err(e) => {
                error!(slug = %slug, error = %e, "Failed to update categories");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

/// `(entry id, slug)` of every post whose body mentions `text`.
pub async fn post_body_contains(
    platform: &dyn ContentPlatform,
    text: &str,
) -> Result<Vec<(String, String)>, MigrateError> {
    let posts = all_entries(
        platform,
        EntryQuery::content_type(BLOG_POST).order("sys.createdAt"),
    )
    .await
    .map_err(MigrateError::Fetch)?;

    let locale = platform.locale();
    Ok(posts
        .iter()
        .filter(|post| body_mentions(post, locale, text))
        .map(|post| {
            let slug = post.field_str("slug", locale).unwrap_or_default();
            (post.sys.id.clone(), slug.to_string())
        })
        .collect())
}

fn body_mentions(post: &Entry, locale: &str, text: &str) -> bool {
    post.field("body", locale)
        .and_then(|body| body.get("content"))
        .map(|content| content.to_string().contains(text))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "http://www.jobcast.net/";

    #[test]
    fn slug_strips_site_prefix_and_one_trailing_slash() {
        assert_eq!(
            post_slug("http://www.jobcast.net/social-recruiting-tips/", SITE),
            "social-recruiting-tips"
        );
        assert_eq!(post_slug("http://www.jobcast.net/2014/05/a-post//", SITE), "2014/05/a-post/");
        assert_eq!(post_slug("http://other.site/a-post", SITE), "http://other.site/a-post");
    }

    #[test]
    fn legacy_link_round_trips_slug() {
        let link = legacy_link("social-recruiting-tips", SITE);
        assert_eq!(link, "http://www.jobcast.net/social-recruiting-tips/");
        assert_eq!(post_slug(&link, SITE), "social-recruiting-tips");
    }

    #[test]
    fn body_search_looks_inside_content_only() {
        let post: Entry = serde_json::from_value(json!({
            "sys": { "id": "p1", "type": "Entry" },
            "fields": {
                "slug": { "en-US": "a-post" },
                "body": { "en-US": {
                    "nodeType": "document",
                    "data": { "note": "needle-in-data" },
                    "content": [{ "nodeType": "paragraph", "data": {}, "content": [
                        { "nodeType": "text", "value": "see trends-2014.pdf", "marks": [], "data": {} }
                    ] }]
                } }
            }
        }))
        .unwrap();

        assert!(body_mentions(&post, "en-US", "trends-2014.pdf"));
        assert!(!body_mentions(&post, "en-US", "needle-in-data"));
        assert!(!body_mentions(&post, "de-DE", "trends-2014.pdf"));
    }
}
