//! Core functionality for the paralympics dashboard
//!
//! This crate provides the control vocabulary (which inputs exist and what
//! values they accept), the per-session control state store and the event bus
//! used to hand updated artifacts to whoever renders them.

pub mod controls;
pub mod events;
pub mod state;

mod error;

// Re-export commonly used types
pub use controls::{ControlId, ControlValue, Feature, GamesType, HostYear, TypeChecklist};
pub use error::ControlError;
pub use events::{Event, EventBus, EventHandler};
pub use state::{ControlSnapshot, ControlStateStore};
