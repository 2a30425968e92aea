//! Terminal query output.

use serde::{Deserialize, Serialize};

/// A stored file the caller can retrieve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Publicly retrievable URL.
    pub url: String,
}

/// The single terminal result of a query.
///
/// Serializes as `{"status": "success", "text": .., "files": [..]}` or
/// `{"status": "error", "message": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryResult {
    Success {
        text: String,
        files: Vec<FileDescriptor>,
    },
    Error {
        message: String,
    },
}

impl QueryResult {
    /// Build an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serialization() {
        let result = QueryResult::Success {
            text: "Hello".to_string(),
            files: vec![FileDescriptor {
                url: "http://host/files/a.jpg".to_string(),
            }],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "text": "Hello",
                "files": [{"url": "http://host/files/a.jpg"}]
            })
        );
    }

    #[test]
    fn test_error_serialization() {
        let json =
            serde_json::to_value(QueryResult::error("No se encontraron resultados.")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "No se encontraron resultados."})
        );
    }
}
