//! Reactive update engine for the paralympics dashboard
//!
//! A [`Session`] owns one control store and one [`Dispatcher`]. When a
//! control changes, the dispatcher recomputes exactly the outputs wired to
//! that control and publishes the new artifacts on the session's event bus.

mod config;
pub mod dispatcher;
pub mod events;
pub mod outputs;
mod session;

use pd_core::ControlError;
use pd_data::DataError;
use thiserror::Error;
use uuid::Uuid;

pub use config::{InitialControls, SessionConfig};
pub use dispatcher::{DispatchReport, Dispatcher, OutputOutcome, OutputSlot, SlotState};
pub use outputs::{BuildContext, BuilderFn, OutputId, OutputRegistration};
pub use session::{Session, SessionManager};

/// Errors surfaced synchronously to whoever sent a control event
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Value outside the control's domain; nothing was recomputed
    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("unknown output '{0}'")]
    UnknownOutput(String),

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("configuration error: {0}")]
    Config(String),
}
