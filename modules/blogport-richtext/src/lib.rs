//! Contentful rich-text documents as produced by the legacy HTML converter,
//! and the structural pass that makes them acceptable to the Contentful
//! rich-text validator.

pub mod error;
pub mod node;
pub mod normalize;

pub use error::RichTextError;
pub use node::{
    asset_targets_mut, AssetDescriptor, AssetTarget, Block, Data, EmbeddedAsset, Node, OtherNode,
    Text,
};
pub use normalize::{normalize, normalize_document, parse_document};
