//! Cursor loops over paginated collections.

use anyhow::Result;

use contentful_client::{Entry, EntryQuery};

use crate::traits::ContentPlatform;

/// Every entry matching `query`, following `skip` until the last page.
pub async fn all_entries(platform: &dyn ContentPlatform, query: EntryQuery) -> Result<Vec<Entry>> {
    let mut items = Vec::new();
    let mut skip = query.skip;
    loop {
        let page = platform.entries(&query.clone().skip(skip)).await?;
        let next = page.next_skip();
        items.extend(page.items);
        match next {
            Some(next) => skip = next,
            None => return Ok(items),
        }
    }
}

/// Ids of every published asset, oldest first.
pub async fn all_published_asset_ids(platform: &dyn ContentPlatform) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut skip = 0;
    loop {
        let page = platform.published_assets(skip).await?;
        let next = page.next_skip();
        ids.extend(page.items.into_iter().map(|asset| asset.sys.id));
        match next {
            Some(next) => skip = next,
            None => return Ok(ids),
        }
    }
}
