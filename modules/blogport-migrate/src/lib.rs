//! Migration of the legacy blog into a Contentful space.

pub mod archive;
pub mod assets;
pub mod authors;
pub mod categories;
pub mod pacing;
pub mod paging;
pub mod posts;
pub mod reachability;
pub mod relink;
pub mod source;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use assets::{AssetResolver, Resolution};
pub use pacing::{PacedPlatform, Pacer};
pub use posts::{PostMigration, PostRunStats};
pub use relink::{relink_assets, RelinkReport};
pub use traits::{ContentPlatform, Reachability, RecordSource};
