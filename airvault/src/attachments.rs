//! Attachment resolution seam.
//!
//! Attachment fields pass their descriptors through an
//! [`AttachmentPipeline`], which decides whether a local copy exists.
//! The importer only consumes the returned reference; downloading is a
//! separate collaborator behind this trait.

use serde_json::Value;

/// One attachment as reported by the records API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub url: String,
    pub filename: String,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
}

impl AttachmentDescriptor {
    /// Reads a descriptor out of a raw attachment-field element. Elements
    /// without a url are not attachments and yield None.
    pub fn from_value(value: &Value) -> Option<Self> {
        let url = value.get("url")?.as_str()?.to_string();
        let filename = value
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or("attachment")
            .to_string();
        Some(Self {
            url,
            filename,
            size: value.get("size").and_then(Value::as_u64),
            mime_type: value
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Where an attachment ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Vault path when local, the remote url otherwise.
    pub path: String,
    pub is_local: bool,
    pub filename: String,
}

impl AttachmentRef {
    /// The frontmatter representation: an embedded link for local files,
    /// the bare url otherwise.
    pub fn property_value(&self) -> String {
        if self.is_local {
            format!("[[{}]]", self.path)
        } else {
            self.path.clone()
        }
    }
}

/// Resolves attachment descriptors to local or remote references.
pub trait AttachmentPipeline: Send + Sync {
    fn resolve(&self, descriptor: &AttachmentDescriptor) -> AttachmentRef;
}

/// Default pipeline: keep every attachment remote. Airtable attachment
/// urls expire after a few hours, so real runs usually swap in a
/// downloading pipeline; this keeps the importer functional without one.
pub struct RemoteAttachments;

impl AttachmentPipeline for RemoteAttachments {
    fn resolve(&self, descriptor: &AttachmentDescriptor) -> AttachmentRef {
        AttachmentRef {
            path: descriptor.url.clone(),
            is_local: false,
            filename: descriptor.filename.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_reads_api_shape() {
        let value = json!({
            "id": "att001",
            "url": "https://dl.airtable.com/x/photo.png",
            "filename": "photo.png",
            "size": 1024,
            "type": "image/png"
        });
        let descriptor = AttachmentDescriptor::from_value(&value).unwrap();
        assert_eq!(descriptor.filename, "photo.png");
        assert_eq!(descriptor.size, Some(1024));
        assert_eq!(descriptor.mime_type.as_deref(), Some("image/png"));
        assert!(AttachmentDescriptor::from_value(&json!({"id": "x"})).is_none());
    }

    #[test]
    fn remote_pipeline_keeps_the_url() {
        let descriptor = AttachmentDescriptor {
            url: "https://dl.airtable.com/x/doc.pdf".to_string(),
            filename: "doc.pdf".to_string(),
            size: None,
            mime_type: None,
        };
        let reference = RemoteAttachments.resolve(&descriptor);
        assert!(!reference.is_local);
        assert_eq!(reference.property_value(), "https://dl.airtable.com/x/doc.pdf");

        let local = AttachmentRef {
            path: "Attachments/doc.pdf".to_string(),
            is_local: true,
            filename: "doc.pdf".to_string(),
        };
        assert_eq!(local.property_value(), "[[Attachments/doc.pdf]]");
    }
}
