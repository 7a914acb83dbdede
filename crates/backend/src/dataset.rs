use std::path::Path;

use atlas_shared::document::parse_document;

/// File the frontend fetches from the data directory.
pub const DOCUMENT_FILE: &str = "composers.json";

/// Entity counts of the served data document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataset {
    pub composers: usize,
    pub studios: usize,
    pub routes: usize,
}

impl Dataset {
    /// Read and parse the document the same way the frontend will.
    pub fn load(data_dir: &Path) -> Result<Self, String> {
        let path = data_dir.join(DOCUMENT_FILE);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let store = parse_document(&text)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

        let routes = store.composers.iter().map(|c| c.routes.len()).sum();
        let drawable = store
            .composers
            .iter()
            .flat_map(|c| &c.routes)
            .filter(|r| r.source().is_some() && r.destination().is_some())
            .count();
        if drawable < routes {
            tracing::warn!(
                skipped = routes - drawable,
                "Some routes lack coordinates and will not be drawn"
            );
        }

        Ok(Dataset {
            composers: store.composers.len(),
            studios: store.studios.len(),
            routes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DOCUMENT_FILE), content).unwrap();
        dir
    }

    #[test]
    fn test_load_counts_entities() {
        let dir = data_dir(
            r#"
            // hand-edited
            {
              "studios": [{"id": "abbey", "center": [-0.18, 51.53]}],
              "composers": [
                {"id": "a", "routes": [{"from": [0, 0], "to": [1, 1]}, {"label": "x"}]},
                {"id": "b"}
              ]
            }"#,
        );
        let dataset = Dataset::load(dir.path()).unwrap();
        assert_eq!(
            dataset,
            Dataset {
                composers: 2,
                studios: 1,
                routes: 2
            }
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::load(dir.path()).unwrap_err();
        assert!(err.starts_with("Failed to read"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = data_dir("{ not json");
        let err = Dataset::load(dir.path()).unwrap_err();
        assert!(err.starts_with("Failed to parse"));
    }
}
