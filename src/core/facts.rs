//! SG-002: Fact document loading.
//!
//! The only filesystem-touching core code. Input errors are fatal: a facts
//! file that is missing, unreadable, or not valid JSON aborts the run before
//! any document is generated. Everything downstream of a successful parse is
//! non-fatal by design.

use super::types::FactDocument;
use std::path::Path;

/// Parse a facts document from a JSON string.
pub fn parse_facts(json: &str) -> Result<FactDocument, String> {
    serde_json::from_str(json).map_err(|e| format!("facts parse error: {}", e))
}

/// Parse a facts document from a file on disk.
pub fn parse_facts_file(path: &Path) -> Result<FactDocument, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_facts(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sg002_parse_empty_document() {
        let doc = parse_facts("{}").unwrap();
        assert!(doc.ldevs.is_none());
        assert!(doc.host_groups.is_none());
    }

    #[test]
    fn test_sg002_parse_invalid_json() {
        let result = parse_facts("{\"ldevs\": [broken");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("facts parse error"));
    }

    #[test]
    fn test_sg002_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_storage_facts.json");
        std::fs::write(
            &path,
            r#"{"ldevs": {"ansible_facts": {"volumes": [{"ldev_id": 42}]}}}"#,
        )
        .unwrap();
        let doc = parse_facts_file(&path).unwrap();
        assert_eq!(
            doc.ldevs.unwrap().ansible_facts.volumes[0].ldev_id,
            Some(42)
        );
    }

    #[test]
    fn test_sg002_missing_file() {
        let result = parse_facts_file(Path::new("/nonexistent/facts.json"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("failed to read"));
    }
}
