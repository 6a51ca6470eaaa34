//! Error types for the wire client and the sync controller.
//!
//! # Design
//! `ApiError` describes what went wrong on the wire. `NotFound` keeps its own
//! variant so the wire client can be tested against 404s, but the controller
//! folds every `ApiError` into `SyncError::Network`: a delete or update on a
//! todo the server no longer has is just another failed round-trip.
//!
//! `SyncError` messages are the copy shown in the error banner.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::types::TodoId;

/// Errors returned by `TodoClient` parse methods and by transports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server returned 404: the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response (connection refused, reset...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// No response arrived within the configured request timeout.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

/// The user-facing operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Load,
    Create,
    Delete,
    Toggle,
    Rename,
    ToggleAll,
    ClearCompleted,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Load => "load",
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Toggle => "toggle",
            Operation::Rename => "rename",
            Operation::ToggleAll => "toggle_all",
            Operation::ClearCompleted => "clear_completed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn network_message(op: &Operation, id: &Option<TodoId>) -> String {
    match (op, id) {
        (Operation::Load, _) => "Unable to load todos".to_string(),
        (Operation::Create, _) => "Unable to add a todo".to_string(),
        (Operation::Delete | Operation::ClearCompleted, _) => "Unable to delete a todo".to_string(),
        (Operation::ToggleAll, Some(id)) => format!("Unable to update todo with ID {id}"),
        (Operation::Toggle | Operation::Rename | Operation::ToggleAll, _) => {
            "Unable to update a todo".to_string()
        }
    }
}

/// Failures surfaced by `SyncController` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The title was empty after trimming. No request was sent.
    #[error("Title should not be empty")]
    Validation,

    /// The transport call for `op` failed. Local state was left as it was
    /// before the call.
    #[error("{}", network_message(.op, .id))]
    Network {
        op: Operation,
        id: Option<TodoId>,
        #[source]
        source: ApiError,
    },

    /// Another operation on this todo is still in flight.
    #[error("Todo {0} is already being updated")]
    Busy(TodoId),

    /// A create is already in flight.
    #[error("A todo is already being added")]
    CreateInFlight,

    /// The todo is not in the local list.
    #[error("Todo {0} is not loaded")]
    Unknown(TodoId),
}

impl SyncError {
    pub fn network(op: Operation, id: Option<TodoId>, source: ApiError) -> Self {
        SyncError::Network { op, id, source }
    }

    /// The todo this failure refers to, if any.
    pub fn todo_id(&self) -> Option<TodoId> {
        match self {
            SyncError::Network { id, .. } => *id,
            SyncError::Busy(id) | SyncError::Unknown(id) => Some(*id),
            SyncError::Validation | SyncError::CreateInFlight => None,
        }
    }

    /// True when the request was turned away locally, before any network call.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, SyncError::Network { .. })
    }
}
