//! Asset pass over a normalized rich-text tree.
//!
//! Must run after [`blogport_richtext::normalize`]: normalization moves
//! embedded assets out of hyperlinks, and every asset has to be visited at
//! its final position.

use std::fmt;

use blogport_richtext::{asset_targets_mut, AssetTarget, Node};

use crate::assets::{AssetResolver, Resolution};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelinkReport {
    pub uploaded: usize,
    pub placeholders: usize,
}

impl fmt::Display for RelinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} placeholders",
            self.uploaded, self.placeholders
        )
    }
}

/// Replace every inline asset descriptor in `nodes` with a link to a
/// Contentful asset, depth-first. Already-linked and unrecognized targets
/// are left alone.
pub async fn relink_assets(
    nodes: &mut [Node],
    resolver: &AssetResolver<'_>,
    slug: &str,
) -> RelinkReport {
    let mut report = RelinkReport::default();

    for target in asset_targets_mut(nodes) {
        let resolution = match &*target {
            AssetTarget::Descriptor(descriptor) => resolver.resolve_embedded(descriptor, slug).await,
            AssetTarget::Link(_) | AssetTarget::Unknown(_) => continue,
        };

        match resolution {
            Resolution::Uploaded(_) => report.uploaded += 1,
            Resolution::Placeholder(_) => report.placeholders += 1,
        }
        *target = AssetTarget::Link(resolution.into_asset_id());
    }

    report
}
