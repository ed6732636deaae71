//! Uploading remote media as Contentful assets.

use tracing::{info, warn};

use blogport_common::MigrateError;
use blogport_richtext::AssetDescriptor;
use contentful_client::{Asset, NewAsset};

use crate::source::MediaRecord;
use crate::traits::{ContentPlatform, Reachability};

/// MIME type for a file extension. Unlisted extensions have none and are
/// left for Contentful to sniff.
pub fn mime_type(extension: &str) -> Option<&'static str> {
    match extension {
        "jpeg" | "jpg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Last path segment of a URL.
pub fn file_name_from_url(url: &str) -> &str {
    url.rsplit(['/', '\\']).next().unwrap_or(url)
}

/// Everything after the last `.` of a URL.
fn extension(url: &str) -> &str {
    url.rsplit('.').next().unwrap_or("")
}

/// How an embedded asset reference was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Uploaded(String),
    Placeholder(String),
}

impl Resolution {
    pub fn asset_id(&self) -> &str {
        match self {
            Resolution::Uploaded(id) | Resolution::Placeholder(id) => id,
        }
    }

    pub fn into_asset_id(self) -> String {
        match self {
            Resolution::Uploaded(id) | Resolution::Placeholder(id) => id,
        }
    }
}

pub struct AssetResolver<'a> {
    platform: &'a dyn ContentPlatform,
    reachability: &'a dyn Reachability,
    image_not_found_id: String,
}

impl<'a> AssetResolver<'a> {
    pub fn new(
        platform: &'a dyn ContentPlatform,
        reachability: &'a dyn Reachability,
        image_not_found_id: &str,
    ) -> Self {
        Self {
            platform,
            reachability,
            image_not_found_id: image_not_found_id.to_string(),
        }
    }

    /// Create, process and publish an asset.
    pub async fn upload(&self, asset: &NewAsset) -> Result<Asset, MigrateError> {
        let created = self
            .platform
            .create_asset(asset)
            .await
            .map_err(MigrateError::Upload)?;
        let processed = self
            .platform
            .process_asset(&created)
            .await
            .map_err(MigrateError::Upload)?;
        self.platform
            .publish_asset(&processed)
            .await
            .map_err(MigrateError::Upload)
    }

    /// Resolve media embedded in a post body. Never fails: anything that
    /// cannot be uploaded becomes the "image not found" asset.
    pub async fn resolve_embedded(&self, descriptor: &AssetDescriptor, slug: &str) -> Resolution {
        let Some(url) = descriptor.url.as_deref() else {
            warn!(slug, "Embedded asset has no source URL");
            return self.placeholder();
        };

        if !self.reachability.exists(url).await {
            info!(slug, url, "Attempted to upload embedded asset but it doesn't exist");
            return self.placeholder();
        }

        info!(slug, url, "Uploading embedded asset");
        let asset = NewAsset {
            title: format!("Blog {slug}"),
            description: descriptor.description.clone(),
            content_type: descriptor
                .content_type
                .clone()
                .or_else(|| mime_type(extension(url)).map(String::from)),
            file_name: descriptor
                .file_name
                .clone()
                .unwrap_or_else(|| file_name_from_url(url).to_string()),
            upload_url: url.to_string(),
        };

        match self.upload(&asset).await {
            Ok(uploaded) => Resolution::Uploaded(uploaded.sys.id),
            Err(e) => {
                warn!(slug, url, error = %e, "Embedded asset upload failed, using placeholder");
                self.placeholder()
            }
        }
    }

    /// Upload a post's featured image. `None` when there is no usable media;
    /// the caller substitutes the default hero.
    pub async fn upload_hero(&self, media: Option<&MediaRecord>, slug: &str) -> Option<Asset> {
        let Some(media) = media else {
            info!(slug, "Hero image doesn't exist");
            return None;
        };
        let url = media.attachment_url.as_str();

        if !self.reachability.exists(url).await {
            info!(slug, url, "Hero image not found");
            return None;
        }

        let file_name = file_name_from_url(url).to_string();
        let asset = NewAsset {
            title: format!("Hero {slug}"),
            description: Some(file_name.clone()),
            content_type: mime_type(extension(url)).map(String::from),
            file_name,
            upload_url: url.to_string(),
        };

        match self.upload(&asset).await {
            Ok(uploaded) => {
                info!(slug, url, asset_id = %uploaded.sys.id, "Uploaded hero image");
                Some(uploaded)
            }
            Err(e) => {
                warn!(slug, url, error = %e, "Hero image upload failed");
                None
            }
        }
    }

    fn placeholder(&self) -> Resolution {
        Resolution::Placeholder(self.image_not_found_id.clone())
    }
}
