use thiserror::Error;

use blogport_richtext::RichTextError;

#[derive(Error, Debug)]
pub enum MigrateError {
    /// The record source could not deliver the input set. Ends the run.
    #[error("Fetch error: {0:#}")]
    Fetch(anyhow::Error),

    /// Asset create, process or publish failed. Callers fall back to a
    /// placeholder asset.
    #[error("Upload error: {0:#}")]
    Upload(anyhow::Error),

    /// Entry create, update or publish failed. Ends the current item only.
    #[error("Platform error: {0:#}")]
    Platform(anyhow::Error),

    #[error(transparent)]
    MalformedTree(#[from] RichTextError),

    #[error("Configuration error: {0}")]
    Config(String),
}
