//! Error types for week session operations
//!
//! Request failures are classified by what the user can do about them:
//! - NetworkOrServerFailure: transport errors, non-2xx responses, malformed bodies
//! - DomainConstraintViolation: the server rejected the change because of a
//!   known constraint (shift time overlap)
//!
//! Neither kind propagates past the week session; both become its error message.

use thiserror::Error;

/// Constraint name the server reports when two shifts overlap.
pub const CLASH_SHIFT_CONSTRAINT: &str = "clash_shift_constraint";

/// User-facing text for [`CLASH_SHIFT_CONSTRAINT`].
pub const CLASH_SHIFT_MESSAGE: &str = "Cannot create/update shift that clashes with another shift";

/// Failure of a remote week/shift request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        if self.is_constraint_violation() {
            FailureKind::DomainConstraintViolation
        } else {
            FailureKind::NetworkOrServerFailure
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        self.to_string().contains(CLASH_SHIFT_CONSTRAINT)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::MalformedResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedResponse(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    NetworkOrServerFailure,
    DomainConstraintViolation,
}

/// Map a caught failure to the text shown to the user.
pub fn error_message(err: &ApiError) -> String {
    if err.is_constraint_violation() {
        return CLASH_SHIFT_MESSAGE.to_string();
    }
    err.to_string()
}

/// An operation was invoked from a session phase that does not allow it.
/// No request is sent when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("No week is selected")]
    NoWeekSelected,

    #[error("Week is still loading")]
    FetchInFlight,

    #[error("Week is not loaded")]
    NotReady,

    #[error("Week is already published")]
    AlreadyPublished,

    #[error("Week has no shifts to publish")]
    NothingToPublish,

    #[error("Publish already in progress")]
    PublishInFlight,

    #[error("No shift selected for deletion")]
    NoPendingDelete,

    #[error("Delete already in progress")]
    DeleteInFlight,
}
