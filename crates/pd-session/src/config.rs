use std::path::Path;

use pd_core::{ControlValue, Feature, HostYear, TypeChecklist};
use pd_data::SourceConfig;
use serde::{Deserialize, Serialize};

use crate::DispatchError;

/// Everything needed to open a session. All fields are optional in JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub source: SourceConfig,
    pub initial: InitialControls,
}

/// Control values a new session starts from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialControls {
    pub category: Feature,
    pub types: TypeChecklist,
    pub hover: Option<HostYear>,
}

impl InitialControls {
    pub fn values(&self) -> [ControlValue; 3] {
        [
            ControlValue::Category(self.category),
            ControlValue::Types(self.types.clone()),
            ControlValue::Hover(self.hover.clone()),
        ]
    }
}

impl SessionConfig {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            source,
            initial: InitialControls::default(),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DispatchError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
            .map_err(|e| DispatchError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json_str(text: &str) -> Result<Self, DispatchError> {
        serde_json::from_str(text).map_err(|e| DispatchError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::GamesType;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = SessionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.initial.category, Feature::Events);
        assert_eq!(config.initial.types.as_slice(), &[GamesType::Summer]);
        assert!(config.initial.hover.is_none());
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
            "source": { "csv_path": "/tmp/p.csv" },
            "initial": { "category": "sports", "types": ["winter", "summer"] }
        }"#;
        let config = SessionConfig::from_json_str(json).unwrap();
        assert_eq!(config.source.csv_path, std::path::PathBuf::from("/tmp/p.csv"));
        assert_eq!(config.initial.category, Feature::Sports);
        assert_eq!(
            config.initial.types.as_slice(),
            &[GamesType::Winter, GamesType::Summer]
        );
    }

    #[test]
    fn test_empty_checklist_rejected() {
        let err = SessionConfig::from_json_str(r#"{"initial": {"types": []}}"#).unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }
}
