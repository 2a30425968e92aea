//! Turning reply attachments into publicly reachable files.

use std::sync::Arc;

use query_core::{FileDescriptor, IncomingMessage, MessageAttachment, ObjectStore, Transport};
use tracing::{debug, warn};

use crate::error::MediaError;
use crate::storage::storage_path;

/// Extension used when an attachment declares no MIME type.
pub const UNDECLARED_EXTENSION: &str = ".jpg";

/// Extension used when a declared MIME type is not recognized.
pub const UNKNOWN_EXTENSION: &str = ".dat";

/// Preferred extensions for types where the registry lists several.
const PREFERRED: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("application/pdf", ".pdf"),
    ("text/plain", ".txt"),
    ("audio/mpeg", ".mp3"),
    ("video/mp4", ".mp4"),
];

/// File extension (with leading dot) for an attachment's MIME type.
pub fn extension_for(mime_type: Option<&str>) -> String {
    let Some(raw) = mime_type else {
        return UNDECLARED_EXTENSION.to_string();
    };

    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        return UNDECLARED_EXTENSION.to_string();
    }

    if let Some((_, ext)) = PREFERRED.iter().find(|(mime, _)| *mime == essence) {
        return ext.to_string();
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| UNKNOWN_EXTENSION.to_string())
}

/// Name a downloaded attachment is stored under.
pub fn file_name(message: &IncomingMessage, attachment: &MessageAttachment) -> String {
    format!(
        "file_{}{}",
        message.id,
        extension_for(attachment.mime_type.as_deref())
    )
}

/// Downloads reply attachments and stores them under command-scoped keys.
pub struct MediaResolver<T: Transport, S: ObjectStore> {
    transport: Arc<T>,
    store: Arc<S>,
    public_url: String,
}

impl<T: Transport, S: ObjectStore> MediaResolver<T, S> {
    pub fn new(transport: Arc<T>, store: Arc<S>, public_url: impl Into<String>) -> Self {
        Self {
            transport,
            store,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Public URL for a stored key.
    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/files/{}", self.public_url, key)
    }

    /// Resolve every attachment in `messages`, in message order.
    ///
    /// An attachment that cannot be downloaded or stored is logged and left
    /// out; the rest of the reply is still returned.
    pub async fn resolve(
        &self,
        command: &str,
        messages: &[IncomingMessage],
    ) -> Vec<FileDescriptor> {
        let mut files = Vec::new();

        for message in messages {
            let Some(attachment) = message.attachment.as_ref() else {
                continue;
            };

            match self.resolve_one(command, message, attachment).await {
                Ok(file) => files.push(file),
                Err(e) => warn!(
                    message_id = message.id,
                    reference = %attachment.reference,
                    error = %e,
                    "Dropping attachment"
                ),
            }
        }

        files
    }

    async fn resolve_one(
        &self,
        command: &str,
        message: &IncomingMessage,
        attachment: &MessageAttachment,
    ) -> Result<FileDescriptor, MediaError> {
        let bytes = self
            .transport
            .download(message)
            .await
            .map_err(MediaError::Download)?;

        let path = storage_path(command, &file_name(message, attachment));
        let stored = self.store.store(bytes, &path).await?;
        let url = self.public_url_for(&stored.key);

        debug!(message_id = message.id, url = %url, "Attachment stored");
        Ok(FileDescriptor { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cache_key;
    use chrono::Utc;
    use mock_responder::{MemoryStore, ScriptedTransport};

    fn photo(id: u64, reference: &str, mime: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            id,
            sender: "@bot".to_string(),
            text: None,
            attachment: Some(MessageAttachment {
                reference: reference.to_string(),
                mime_type: mime.map(str::to_string),
            }),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for(Some("image/jpeg")), ".jpg");
        assert_eq!(extension_for(Some("image/png")), ".png");
        assert_eq!(extension_for(Some("application/pdf")), ".pdf");
        assert_eq!(extension_for(Some("IMAGE/JPEG; q=1")), ".jpg");
    }

    #[test]
    fn test_extension_for_missing_or_unknown() {
        assert_eq!(extension_for(None), ".jpg");
        assert_eq!(extension_for(Some("")), ".jpg");
        assert_eq!(extension_for(Some("application/x-made-up")), ".dat");
    }

    #[test]
    fn test_extension_from_registry() {
        assert_eq!(extension_for(Some("image/gif")), ".gif");
    }

    #[test]
    fn test_file_name() {
        let message = photo(42, "att-1", Some("image/png"));
        let attachment = message.attachment.clone().unwrap();
        assert_eq!(file_name(&message, &attachment), "file_42.png");
    }

    #[tokio::test]
    async fn test_resolve_stores_in_order() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.with_download("att-1", b"one");
        transport.with_download("att-2", b"two");
        let store = Arc::new(MemoryStore::new());
        let resolver = MediaResolver::new(transport, store.clone(), "https://api.example.com/");

        let messages = vec![
            photo(7, "att-1", Some("image/jpeg")),
            IncomingMessage::text(8, "@bot", "caption only"),
            photo(9, "att-2", None),
        ];
        let files = resolver.resolve("/cla 12345678", &messages).await;

        let hash = cache_key("/cla", "12345678");
        assert_eq!(
            files,
            vec![
                FileDescriptor {
                    url: format!("https://api.example.com/files/cla/{}/file_7.jpg", hash)
                },
                FileDescriptor {
                    url: format!("https://api.example.com/files/cla/{}/file_9.jpg", hash)
                },
            ]
        );
        assert_eq!(
            store.get(&format!("cla/{}/file_7.jpg", hash)),
            Some(b"one".to_vec())
        );
    }

    #[tokio::test]
    async fn test_failed_download_is_dropped() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.with_download("att-2", b"two");
        let store = Arc::new(MemoryStore::new());
        let resolver = MediaResolver::new(transport, store.clone(), "http://h");

        let messages = vec![
            photo(1, "missing", Some("image/png")),
            photo(2, "att-2", Some("image/png")),
        ];
        let files = resolver.resolve("/afp 12345678", &messages).await;

        assert_eq!(files.len(), 1);
        assert!(files[0].url.ends_with("/file_2.png"));
        assert_eq!(store.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_store_is_dropped() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.with_download("att-1", b"one");
        let resolver = MediaResolver::new(transport, Arc::new(MemoryStore::failing()), "http://h");

        let files = resolver
            .resolve("/afp 12345678", &[photo(1, "att-1", None)])
            .await;
        assert!(files.is_empty());
    }
}
