//! Clean-up of assets nothing links to.

use tracing::{error, info};

use blogport_common::MigrateError;

use crate::paging::all_published_asset_ids;
use crate::traits::ContentPlatform;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    pub checked: usize,
    pub archived: usize,
    pub failed: usize,
}

/// Unpublish and archive every published asset no published entry links to.
///
/// Links are counted through the Delivery API, which only sees published
/// entries. An asset linked only from a draft counts as unlinked, so run
/// this after every post has been published.
pub async fn archive_unlinked_assets(
    platform: &dyn ContentPlatform,
) -> Result<ArchiveStats, MigrateError> {
    let asset_ids = all_published_asset_ids(platform)
        .await
        .map_err(MigrateError::Fetch)?;
    info!(count = asset_ids.len(), "Fetched published assets");

    let mut stats = ArchiveStats::default();
    for asset_id in &asset_ids {
        stats.checked += 1;

        let result = async {
            if platform.published_entries_linking_to(asset_id).await? > 0 {
                return anyhow::Ok(false);
            }
            let asset = platform.get_asset(asset_id).await?;
            let asset = platform.unpublish_asset(&asset).await?;
            platform.archive_asset(&asset).await?;
            Ok(true)
        }
        .await;

        match result {
            Ok(true) => {
                info!(asset_id = %asset_id, "Archived unlinked asset");
                stats.archived += 1;
            }
            Ok(false) => {}
            Err(e) => {
                error!(asset_id = %asset_id, error = %e, "Failed to archive asset");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
