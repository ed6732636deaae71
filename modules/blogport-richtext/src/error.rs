use thiserror::Error;

#[derive(Error, Debug)]
pub enum RichTextError {
    #[error("Malformed rich text tree: {0}")]
    MalformedTree(String),
}

impl From<serde_json::Error> for RichTextError {
    fn from(err: serde_json::Error) -> Self {
        RichTextError::MalformedTree(err.to_string())
    }
}
