//! Control state management
//!
//! One [`ControlStateStore`] exists per session and holds the authoritative
//! value of every control. Rejected updates never touch the stored value.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::controls::{ControlId, ControlValue, Feature, HostYear, TypeChecklist};
use crate::ControlError;

/// Current value of every control for a session
#[derive(Debug, Clone, Default)]
pub struct ControlStateStore {
    values: AHashMap<ControlId, ControlValue>,
}

/// Full view of the control state at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub category: Feature,
    pub types: TypeChecklist,
    pub hover: Option<HostYear>,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        ControlStateStore::new().snapshot()
    }
}

impl ControlStateStore {
    /// Create a store where every control holds its domain default
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new value, returning the one it replaced
    pub fn set(&mut self, value: ControlValue) -> Result<ControlValue, ControlError> {
        value.validate()?;
        let control = value.control_id();
        let previous = self
            .values
            .insert(control, value)
            .unwrap_or_else(|| ControlValue::default_for(control));
        tracing::debug!("Control '{}' updated", control);
        Ok(previous)
    }

    /// Current value, or the domain default when the control was never set
    pub fn get(&self, control: ControlId) -> ControlValue {
        self.values
            .get(&control)
            .cloned()
            .unwrap_or_else(|| ControlValue::default_for(control))
    }

    pub fn category(&self) -> Feature {
        match self.get(ControlId::Category) {
            ControlValue::Category(feature) => feature,
            _ => Feature::default(),
        }
    }

    pub fn types(&self) -> TypeChecklist {
        match self.get(ControlId::Types) {
            ControlValue::Types(types) => types,
            _ => TypeChecklist::default(),
        }
    }

    pub fn hover(&self) -> Option<HostYear> {
        match self.get(ControlId::Hover) {
            ControlValue::Hover(key) => key,
            _ => None,
        }
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            category: self.category(),
            types: self.types(),
            hover: self.hover(),
        }
    }
}
