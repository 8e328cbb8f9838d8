//! Week indexing and week-session reconciliation for a staff shift scheduler.
//!
//! - [`week`]: canonical week identifiers and their UTC windows
//! - [`week_state`]: the session state machine for the week being viewed
//! - [`controller`]: tokio task that drives a session against a [`api::WeekApi`]
//! - [`api`]: the remote week/shift API and its HTTP client

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod types;
pub mod week;
pub mod week_state;

pub use api::{HttpWeekApi, WeekApi};
pub use controller::{ControllerError, WeekController};
pub use error::{error_message, ApiError, FailureKind, TransitionError};
pub use types::{PublishWeekPayload, PublishedWeek, Shift, ShiftId, Week, WeekLite};
pub use week::{current_week_id, window_of, WeekId, WeekWindow};
pub use week_state::{Outcome, PhaseKind, SessionSnapshot, WeekPhase, WeekState};
