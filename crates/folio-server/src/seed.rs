//! JSON fixtures for the in-process store
//!
//! A fixture is one JSON object mapping document paths to document bodies:
//!
//! ```json
//! { "works/w1": { "owner": "u1", "title": "T" },
//!   "users/u1": { "displayName": "Al" } }
//! ```

use crate::error::SeedError;
use folio_store::{DocPath, DocumentStore, Fields, MemoryStore};
use serde_json::Value;
use std::path::Path;

/// Parse fixture text into `(path, fields)` pairs
///
/// # Errors
/// `SeedError` for invalid JSON, non-object bodies or bad paths
pub fn parse_fixture(text: &str) -> Result<Vec<(DocPath, Fields)>, SeedError> {
    let entries: serde_json::Map<String, Value> = serde_json::from_str(text)?;
    entries
        .into_iter()
        .map(|(key, body)| {
            let path = key.parse::<DocPath>().map_err(|source| SeedError::InvalidPath {
                key: key.clone(),
                source,
            })?;
            match body {
                Value::Object(fields) => Ok((path, fields)),
                _ => Err(SeedError::NotAnObject { key }),
            }
        })
        .collect()
}

/// Write every document of the fixture at `path` into `store`
///
/// Returns the number of documents written.
///
/// # Errors
/// `SeedError` if the file cannot be read or parsed, or a write fails
pub async fn load_fixture(store: &MemoryStore, path: impl AsRef<Path>) -> Result<usize, SeedError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let documents = parse_fixture(&text)?;
    let count = documents.len();
    for (doc_path, fields) in documents {
        store.set(&doc_path, fields).await?;
    }
    tracing::info!(fixture = %path.display(), documents = count, "store seeded");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_paths_and_bodies() {
        let docs = parse_fixture(r#"{ "works/w1": { "owner": "u1" }, "users/u1": {} }"#).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().any(|(p, _)| p.to_string() == "works/w1"));
    }

    #[test]
    fn rejects_collection_keys() {
        let err = parse_fixture(r#"{ "works": {} }"#).unwrap_err();
        assert!(matches!(err, SeedError::InvalidPath { .. }));
    }

    #[test]
    fn rejects_scalar_bodies() {
        let err = parse_fixture(r#"{ "works/w1": 3 }"#).unwrap_err();
        assert!(matches!(err, SeedError::NotAnObject { key } if key == "works/w1"));
    }

    #[test]
    fn rejects_non_object_fixture() {
        assert!(matches!(parse_fixture("[]"), Err(SeedError::Parse(_))));
    }

    #[tokio::test]
    async fn loads_file_into_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "works/w1": {{ "owner": "u1", "title": "T" }}, "users/u1": {{ "displayName": "Al" }} }}"#
        )
        .unwrap();

        let store = MemoryStore::new();
        assert_eq!(load_fixture(&store, file.path()).await.unwrap(), 2);

        let work = store.get(&"works/w1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(work.get_str("title"), Some("T"));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_fixture(&MemoryStore::new(), dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }
}
