//! Gist request bodies.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::domain::errors::DomainError;
use crate::domain::model::NamedBlob;

/// JSON body for `POST /gists`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GistPayload {
    pub description: String,
    pub public: bool,
    pub files: Map<String, Value>,
}

impl GistPayload {
    /// Build a payload from collected blobs.
    ///
    /// Blobs are keyed by name; a later blob with the same name replaces an earlier one.
    pub fn from_blobs(
        description: impl Into<String>,
        public: bool,
        blobs: &[NamedBlob],
    ) -> Result<Self, DomainError> {
        if blobs.is_empty() {
            return Err(DomainError::NothingToUpload);
        }

        let mut files = Map::new();
        for blob in blobs {
            files.insert(blob.name.clone(), json!({ "content": blob.text }));
        }

        Ok(Self {
            description: description.into(),
            public,
            files,
        })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
