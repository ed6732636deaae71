use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use blogport_migrate::archive::archive_unlinked_assets;
use blogport_migrate::authors::{send_author_slugs, send_authors, PERSON};
use blogport_migrate::categories::{create_categories, BLOG_CATEGORY, CATEGORIES};
use blogport_migrate::posts::{post_body_contains, update_posts_without_categories, BLOG_POST};
use blogport_migrate::testing::{post, simple_body, MockPlatform, MockRecordSource, SITE};
use blogport_migrate::{PacedPlatform, Pacer};
use contentful_client::DEFAULT_LOCALE;

// --- Authors ---

#[tokio::test]
async fn authors_with_posts_get_person_entries_and_recorded_ids() {
    let source = MockRecordSource::new()
        .with_author("jane", None)
        .with_author("ghost", None)
        .with_post(post(1, "p1", simple_body("Hello")));
    let platform = MockPlatform::new();

    let stats = send_authors(&source, &platform).await.unwrap();

    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 0);
    let people = platform.entries_of(PERSON);
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].field_str("name", DEFAULT_LOCALE), Some("jane"));
    assert!(people[0].sys.published_version.is_some());
    assert_eq!(
        source.author("jane").unwrap().contentful_id.as_deref(),
        Some(people[0].sys.id.as_str())
    );
    assert_eq!(source.author("ghost").unwrap().contentful_id, None);
}

#[tokio::test]
async fn author_slugs_are_set_and_missing_entries_counted_as_failures() {
    let source = MockRecordSource::new()
        .with_author("Jane.Doe", None)
        .with_author("bob", Some("not-in-space"))
        .with_post(blogport_migrate::source::PostRecord {
            creator: "Jane.Doe".to_string(),
            ..post(1, "p1", simple_body("Hello"))
        });
    let platform = MockPlatform::new();
    send_authors(&source, &platform).await.unwrap();

    let stats = send_author_slugs(&source, &platform).await.unwrap();

    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    let jane = platform.entry_by_slug(PERSON, "author/jane-doe").unwrap();
    assert_eq!(jane.field_str("name", DEFAULT_LOCALE), Some("Jane.Doe"));
}

// --- Categories ---

#[tokio::test]
async fn categories_are_created_once() {
    let platform = MockPlatform::new();

    assert_eq!(create_categories(&platform).await.unwrap(), CATEGORIES.len());
    assert_eq!(create_categories(&platform).await.unwrap(), 0);

    let entries = platform.entries_of(BLOG_CATEGORY);
    assert_eq!(entries.len(), CATEGORIES.len());
    assert!(entries.iter().all(|e| e.sys.published_version.is_some()));
    let link_love = platform.entry_by_slug(BLOG_CATEGORY, "link-love").unwrap();
    assert_eq!(link_love.field_str("name", DEFAULT_LOCALE), Some("Link Love"));
}

#[tokio::test]
async fn posts_without_categories_get_them_from_the_legacy_link() {
    let source = MockRecordSource::new()
        .with_post(post(1, "p1", simple_body("Hello")))
        .with_post(post(3, "p3", simple_body("Hello")))
        .with_categories(1, &["Link Love"]);
    let platform = MockPlatform::new()
        .with_page_size(1)
        .with_entry(BLOG_CATEGORY, json!({ "name": "Link Love", "slug": "link-love" }))
        .with_entry(BLOG_POST, json!({ "slug": "p1" }))
        .with_entry(BLOG_POST, json!({ "slug": "p2", "categories": [] }))
        .with_entry(BLOG_POST, json!({ "slug": "p3" }));

    let stats = update_posts_without_categories(&source, &platform, SITE)
        .await
        .unwrap();

    assert_eq!(stats.updated, 1);
    assert_eq!(stats.without_categories, 1);
    assert_eq!(stats.failed, 0);

    let p1 = platform.entry_by_slug(BLOG_POST, "p1").unwrap();
    assert_eq!(
        p1.field("categories", DEFAULT_LOCALE),
        Some(&json!([{ "sys": { "type": "Link", "linkType": "Entry", "id": "seed-1" } }]))
    );
    assert!(platform
        .entry_by_slug(BLOG_POST, "p3")
        .unwrap()
        .field("categories", DEFAULT_LOCALE)
        .is_none());
}

// --- Search ---

#[tokio::test]
async fn body_search_pages_through_every_post() {
    let platform = MockPlatform::new()
        .with_page_size(1)
        .with_entry(BLOG_POST, json!({ "slug": "p1", "body": simple_body("Get trends-2014.pdf") }))
        .with_entry(BLOG_POST, json!({ "slug": "p2", "body": simple_body("Nothing here") }))
        .with_entry(BLOG_POST, json!({ "slug": "p3", "body": simple_body("trends-2014.pdf again") }));

    let found = post_body_contains(&platform, "trends-2014.pdf").await.unwrap();

    assert_eq!(
        found,
        vec![
            ("seed-1".to_string(), "p1".to_string()),
            ("seed-3".to_string(), "p3".to_string()),
        ]
    );
}

// --- Assets ---

#[tokio::test]
async fn only_unlinked_assets_are_archived() {
    let platform = MockPlatform::new()
        .with_published_asset("linked")
        .with_published_asset("orphan-1")
        .with_published_asset("orphan-2")
        .with_entry(
            BLOG_POST,
            json!({
                "slug": "p1",
                "heroImage": { "sys": { "type": "Link", "linkType": "Asset", "id": "linked" } }
            }),
        );

    let stats = archive_unlinked_assets(&platform).await.unwrap();

    assert_eq!(stats.checked, 3);
    assert_eq!(stats.archived, 2);
    assert_eq!(stats.failed, 0);
    for asset in platform.assets() {
        let archived = asset.sys.archived_version.is_some();
        assert_eq!(archived, asset.sys.id != "linked", "asset {}", asset.sys.id);
        assert_eq!(asset.sys.published_version.is_some(), !archived);
    }
}

// --- Pacing ---

#[tokio::test(start_paused = true)]
async fn paced_platform_spaces_every_call() {
    let platform = PacedPlatform::new(MockPlatform::new(), Pacer::new(Duration::from_millis(500)));
    let start = Instant::now();

    create_categories(&platform).await.unwrap();

    let calls = platform.inner().calls().len() as u32;
    assert_eq!(calls, 3 * CATEGORIES.len() as u32);
    assert!(start.elapsed() >= Duration::from_millis(500) * (calls - 1));
}
