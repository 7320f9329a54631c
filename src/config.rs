//! Construction parameters for a storage node.

use crate::storage::{StorageError, StorageResult};
use crate::store::UnitId;
use serde::{Deserialize, Serialize};

/// Everything a node needs at construction except its forcing handle,
/// which stays with the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageNodeConfig {
    /// Category label, e.g. "soil" or "channel".
    pub kind: String,
    pub id: UnitId,
    /// Extent of the node. Units are the driver's business.
    pub area: f64,
    /// Whether the driver wants per-step budget summaries.
    #[serde(default)]
    pub verbose: bool,
}

impl StorageNodeConfig {
    pub fn new(kind: impl Into<String>, id: impl Into<UnitId>, area: f64) -> Self {
        Self { kind: kind.into(), id: id.into(), area, verbose: false }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn from_json(text: &str) -> StorageResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.kind.trim().is_empty() {
            return Err(StorageError::invalid_config("kind", "must not be empty"));
        }
        if !self.area.is_finite() {
            let reason = format!("must be finite, got {}", self.area);
            return Err(StorageError::invalid_config("area", reason));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_json_defaults_verbose() {
        let text = r#"{"kind": "soil", "id": 1, "area": 25.0}"#;
        let cfg = StorageNodeConfig::from_json(text).unwrap();
        assert_eq!(cfg, StorageNodeConfig::new("soil", 1i64, 25.0));
        assert!(!cfg.verbose);
    }

    #[test]
    fn test_from_json_text_id() {
        let text = r#"{"kind": "gw", "id": "north", "area": 1.0, "verbose": true}"#;
        let cfg = StorageNodeConfig::from_json(text).unwrap();
        assert_eq!(cfg.id, UnitId::Text("north".into()));
        assert!(cfg.verbose);
    }

    #[rstest]
    #[case(r#"{"kind": "", "id": 1, "area": 1.0}"#, "kind")]
    #[case(r#"{"kind": "   ", "id": 1, "area": 1.0}"#, "kind")]
    fn test_from_json_rejects_bad_fields(#[case] text: &str, #[case] field: &str) {
        match StorageNodeConfig::from_json(text) {
            Err(StorageError::InvalidConfig { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_finite_area() {
        let cfg = StorageNodeConfig::new("soil", 1i64, f64::NAN);
        assert!(matches!(cfg.validate(), Err(StorageError::InvalidConfig { field: "area", .. })));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = StorageNodeConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
