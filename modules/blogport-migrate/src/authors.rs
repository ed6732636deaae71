//! Author migration: `person` entries and their slugs.

use serde_json::json;
use tracing::{error, info};

use blogport_common::MigrateError;
use contentful_client::Fields;

use crate::traits::{ContentPlatform, RecordSource};

pub const PERSON: &str = "person";

/// `author/<login>` with the login lowercased, whitespace and dots turned
/// into dashes and `@` dropped.
pub fn author_slug(login: &str) -> String {
    let login: String = login
        .to_lowercase()
        .chars()
        .filter(|c| *c != '@')
        .map(|c| if c.is_whitespace() || c == '.' { '-' } else { c })
        .collect();
    format!("author/{login}")
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuthorRunStats {
    pub succeeded: usize,
    pub failed: usize,
}

/// Create and publish a `person` entry for every author that has posts but no
/// entry yet, and record the new entry id in the legacy database.
pub async fn send_authors(
    source: &dyn RecordSource,
    platform: &dyn ContentPlatform,
) -> Result<AuthorRunStats, MigrateError> {
    let authors = source
        .fetch_authors_without_destination_id()
        .await
        .map_err(MigrateError::Fetch)?;
    info!(count = authors.len(), "Fetched authors without a Contentful entry");

    let locale = platform.locale().to_string();
    let mut stats = AuthorRunStats::default();

    for author in &authors {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!({ &locale: author.name }));
        fields.insert("email".to_string(), json!({ &locale: author.email }));

        let result = async {
            let entry = platform.create_entry(PERSON, fields).await?;
            let entry = platform.publish_entry(&entry).await?;
            source
                .record_author_destination_id(&author.login, &entry.sys.id)
                .await?;
            anyhow::Ok(entry)
        }
        .await;

        match result {
            Ok(entry) => {
                info!(login = %author.login, entry_id = %entry.sys.id, "Author migrated");
                stats.succeeded += 1;
            }
            Err(e) => {
                error!(login = %author.login, error = %e, "Failed to migrate author");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

/// Give every migrated author entry its `author/<login>` slug.
pub async fn send_author_slugs(
    source: &dyn RecordSource,
    platform: &dyn ContentPlatform,
) -> Result<AuthorRunStats, MigrateError> {
    let authors = source
        .fetch_authors_with_destination_id()
        .await
        .map_err(MigrateError::Fetch)?;

    let locale = platform.locale().to_string();
    let mut stats = AuthorRunStats::default();

    for author in &authors {
        let Some(ref entry_id) = author.contentful_id else {
            continue;
        };
        info!(login = %author.login, "Setting author slug");

        let result = async {
            let mut entry = platform.get_entry(entry_id).await?;
            entry.set_field("slug", &locale, json!(author_slug(&author.login)));
            let updated = platform.update_entry(&entry).await?;
            platform.publish_entry(&updated).await
        }
        .await;

        match result {
            Ok(_) => stats.succeeded += 1,
            Err(e) => {
                error!(login = %author.login, error = %e, "Failed to set author slug");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
