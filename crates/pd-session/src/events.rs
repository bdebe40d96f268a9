//! Events published by the dispatcher after each output build

use pd_core::impl_event;
use pd_data::ErrorKind;
use pd_views::Artifact;

use crate::OutputId;

/// An output finished building and holds a new artifact
#[derive(Debug, Clone)]
pub struct OutputUpdated {
    pub output: OutputId,
    pub artifact: Artifact,
}

/// An output failed to build; `retained` is what it still shows
#[derive(Debug, Clone)]
pub struct OutputFailed {
    pub output: OutputId,
    pub kind: ErrorKind,
    pub message: String,
    pub retained: Option<Artifact>,
}

impl_event!(OutputUpdated, OutputFailed);
