use serde::Serialize;

use crate::error::{CatalogError, CatalogResult};
use crate::types::EntityId;

/// A newly attached image awaiting upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// One named part of a product submission
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadPart {
    Text(String),
    File(ImageUpload),
}

/// Ordered multipart submission for product create/update.
///
/// Part order is preserved through to the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPayload {
    parts: Vec<(String, PayloadPart)>,
}

impl ProductPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text part
    pub fn push_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parts.push((key.into(), PayloadPart::Text(value.into())));
    }

    /// Append a file part
    pub fn push_file(&mut self, key: impl Into<String>, upload: ImageUpload) {
        self.parts.push((key.into(), PayloadPart::File(upload)));
    }

    /// First text value stored under `key`
    pub fn text(&self, key: &str) -> Option<&str> {
        self.parts.iter().find_map(|(name, part)| match part {
            PayloadPart::Text(value) if name == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.parts.iter().any(|(name, _)| name == key)
    }

    /// Part names in submission order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn file_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|(_, part)| matches!(part, PayloadPart::File(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[(String, PayloadPart)] {
        &self.parts
    }

    /// Consume into the wire form
    pub fn into_multipart(self) -> CatalogResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (key, part) in self.parts {
            form = match part {
                PayloadPart::Text(value) => form.text(key, value),
                PayloadPart::File(upload) => {
                    let part = reqwest::multipart::Part::bytes(upload.data)
                        .file_name(upload.file_name)
                        .mime_str(&upload.content_type)
                        .map_err(|e| {
                            CatalogError::serialization(format!("invalid content type: {e}"))
                        })?;
                    form.part(key, part)
                }
            };
        }
        Ok(form)
    }
}

/// Product-group submission; only present fields reach the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductGroupPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl ProductGroupPayload {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.title.is_none() && self.priority.is_none()
    }
}
