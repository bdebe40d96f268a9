use thiserror::Error;

use crate::controls::{ControlId, GamesType};

/// Errors raised when a control value falls outside its domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("invalid value '{value}' for control '{control}'")]
    InvalidParameter { control: ControlId, value: String },

    #[error("the games type checklist must keep at least one selection")]
    EmptyChecklist,

    #[error("games type '{0}' is selected more than once")]
    DuplicateType(GamesType),

    #[error("malformed host-year key '{0}', expected '<host> <year>'")]
    MalformedKey(String),
}

impl ControlError {
    /// The control the rejected value was aimed at
    pub fn control(&self) -> ControlId {
        match self {
            ControlError::InvalidParameter { control, .. } => *control,
            ControlError::EmptyChecklist | ControlError::DuplicateType(_) => ControlId::Types,
            ControlError::MalformedKey(_) => ControlId::Hover,
        }
    }
}
