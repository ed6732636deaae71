use serde_json::json;

use blogport_common::config::IMAGE_NOT_FOUND_ASSET_ID;
use blogport_migrate::testing::{asset_descriptor, MockPlatform, MockReachability};
use blogport_migrate::{relink_assets, AssetResolver, ContentPlatform, RelinkReport, Resolution};
use blogport_richtext::{
    normalize_document, AssetDescriptor, AssetTarget, EmbeddedAsset, Node,
};
use contentful_client::DEFAULT_LOCALE;

const CHART: &str = "http://www.jobcast.net/wp-content/uploads/2014/05/chart.png";
const GONE: &str = "http://www.jobcast.net/wp-content/uploads/2012/01/gone.jpg";

fn descriptor(url: &str) -> AssetDescriptor {
    AssetDescriptor {
        url: Some(url.to_string()),
        content_type: Some("image/png".to_string()),
        file_name: Some("chart.png".to_string()),
        title: Some("chart".to_string()),
        description: Some("Quarterly chart".to_string()),
    }
}

fn targets(node: &Node) -> Vec<AssetTarget> {
    let mut found = Vec::new();
    if let Node::EmbeddedAsset(EmbeddedAsset { target, .. }) = node {
        found.push(target.clone());
    }
    for child in node.children().unwrap_or_default() {
        found.extend(targets(child));
    }
    found
}

#[tokio::test]
async fn reachable_media_is_uploaded_processed_and_published() {
    let platform = MockPlatform::new();
    let reachability = MockReachability::new().reachable(CHART);
    let resolver = AssetResolver::new(&platform, &reachability, IMAGE_NOT_FOUND_ASSET_ID);

    let resolution = resolver.resolve_embedded(&descriptor(CHART), "a-post").await;

    let Resolution::Uploaded(id) = resolution else {
        panic!("expected an upload, got {resolution:?}");
    };
    let asset = platform.get_asset(&id).await.unwrap();
    assert!(asset.sys.published_version.is_some());
    assert_eq!(asset.file_url(DEFAULT_LOCALE), Some(CHART));
    assert_eq!(asset.fields["title"][DEFAULT_LOCALE], "Blog a-post");
    assert_eq!(asset.fields["description"][DEFAULT_LOCALE], "Quarterly chart");
    assert_eq!(asset.fields["file"][DEFAULT_LOCALE]["fileName"], "chart.png");
}

#[tokio::test]
async fn unreachable_media_resolves_to_placeholder_every_time() {
    let platform = MockPlatform::new();
    let reachability = MockReachability::new();
    let resolver = AssetResolver::new(&platform, &reachability, IMAGE_NOT_FOUND_ASSET_ID);

    for _ in 0..2 {
        let resolution = resolver.resolve_embedded(&descriptor(GONE), "a-post").await;
        assert_eq!(
            resolution,
            Resolution::Placeholder(IMAGE_NOT_FOUND_ASSET_ID.to_string())
        );
    }

    assert!(platform.assets().is_empty());
    assert_eq!(reachability.checked(), vec![GONE, GONE]);
}

#[tokio::test]
async fn failed_upload_falls_back_to_placeholder() {
    let platform = MockPlatform::new().failing_asset_uploads();
    let reachability = MockReachability::new().reachable(CHART);
    let resolver = AssetResolver::new(&platform, &reachability, IMAGE_NOT_FOUND_ASSET_ID);

    let resolution = resolver.resolve_embedded(&descriptor(CHART), "a-post").await;

    assert_eq!(resolution.asset_id(), IMAGE_NOT_FOUND_ASSET_ID);
}

#[tokio::test]
async fn missing_content_type_is_derived_from_the_extension() {
    let url = "http://www.jobcast.net/wp-content/uploads/team.jpg";
    let platform = MockPlatform::new();
    let reachability = MockReachability::new().reachable(url);
    let resolver = AssetResolver::new(&platform, &reachability, IMAGE_NOT_FOUND_ASSET_ID);
    let descriptor = AssetDescriptor {
        url: Some(url.to_string()),
        ..AssetDescriptor::default()
    };

    let resolution = resolver.resolve_embedded(&descriptor, "a-post").await;

    let asset = platform.get_asset(resolution.asset_id()).await.unwrap();
    let file = &asset.fields["file"][DEFAULT_LOCALE];
    assert_eq!(file["contentType"], "image/jpeg");
    assert_eq!(file["fileName"], "team.jpg");
}

#[tokio::test]
async fn descriptor_without_url_is_never_checked() {
    let platform = MockPlatform::new();
    let reachability = MockReachability::new();
    let resolver = AssetResolver::new(&platform, &reachability, IMAGE_NOT_FOUND_ASSET_ID);

    let resolution = resolver
        .resolve_embedded(&AssetDescriptor::default(), "a-post")
        .await;

    assert_eq!(resolution.asset_id(), IMAGE_NOT_FOUND_ASSET_ID);
    assert!(reachability.checked().is_empty());
}

#[tokio::test]
async fn hero_upload_uses_url_for_name_and_mime_type() {
    let platform = MockPlatform::new();
    let url = "http://www.jobcast.net/wp-content/uploads/team.jpg";
    let reachability = MockReachability::new().reachable(url);
    let resolver = AssetResolver::new(&platform, &reachability, IMAGE_NOT_FOUND_ASSET_ID);
    let media = blogport_migrate::source::MediaRecord {
        post_id: 11,
        post_parent: 1,
        link: None,
        title: None,
        post_type: Some("attachment".to_string()),
        attachment_url: url.to_string(),
    };

    let hero = resolver.upload_hero(Some(&media), "a-post").await.unwrap();

    let file = &hero.fields["file"][DEFAULT_LOCALE];
    assert_eq!(file["fileName"], "team.jpg");
    assert_eq!(file["contentType"], "image/jpeg");
    assert_eq!(hero.fields["title"][DEFAULT_LOCALE], "Hero a-post");
    assert_eq!(hero.fields["description"][DEFAULT_LOCALE], "team.jpg");
    assert!(resolver.upload_hero(None, "a-post").await.is_none());
}

#[tokio::test]
async fn relink_replaces_descriptors_depth_first_and_keeps_links() {
    let raw = json!({
        "nodeType": "document",
        "data": {},
        "content": [
            asset_descriptor(CHART),
            { "nodeType": "hyperlink", "data": { "uri": "http://x.com" }, "content": [
                { "nodeType": "text", "value": "see" },
                asset_descriptor(GONE)
            ] },
            { "nodeType": "embedded-asset-block", "data": { "target": {
                "sys": { "type": "Link", "linkType": "Asset", "id": "existing" }
            } }, "content": [] }
        ]
    });
    let mut body = normalize_document(serde_json::from_value(raw).unwrap()).unwrap();

    let platform = MockPlatform::new();
    let reachability = MockReachability::new().reachable(CHART);
    let resolver = AssetResolver::new(&platform, &reachability, IMAGE_NOT_FOUND_ASSET_ID);

    let report = relink_assets(std::slice::from_mut(&mut body), &resolver, "a-post").await;

    assert_eq!(
        report,
        RelinkReport {
            uploaded: 1,
            placeholders: 1
        }
    );
    assert_eq!(reachability.checked(), vec![CHART, GONE]);

    let uploaded = platform.assets()[0].sys.id.clone();
    assert_eq!(
        targets(&body),
        vec![
            AssetTarget::link(uploaded),
            AssetTarget::link(IMAGE_NOT_FOUND_ASSET_ID),
            AssetTarget::link("existing"),
        ]
    );
}
