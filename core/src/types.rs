//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any schema drift between the two crates. The wire
//! name of the owner field is `userId`.
//!
//! A todo that is still being created is a `PendingTodo`, never a `Todo`
//! carrying a sentinel id, so a server that hands out id `0` cannot collide
//! with the placeholder.

use serde::{Deserialize, Serialize};

pub type TodoId = i64;
pub type OwnerId = i64;

/// A persisted todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    pub title: String,
    pub completed: bool,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
}

/// Request payload for updating an existing todo. The full entity is always
/// sent so the server never has to merge partial state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
}

impl From<&Todo> for UpdateTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title.clone(),
            completed: todo.completed,
            owner_id: todo.owner_id,
        }
    }
}

/// Placeholder shown while a create request is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTodo {
    pub title: String,
    pub completed: bool,
    pub owner_id: OwnerId,
}

impl PendingTodo {
    pub fn new(title: &str, owner_id: OwnerId) -> Self {
        Self {
            title: title.to_string(),
            completed: false,
            owner_id,
        }
    }

    pub fn to_create(&self) -> CreateTodo {
        CreateTodo {
            title: self.title.clone(),
            completed: self.completed,
            owner_id: self.owner_id,
        }
    }
}

/// One renderable line of the list: either a persisted todo or the
/// placeholder for a create in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    PendingCreate(PendingTodo),
    Persisted(Todo),
}

impl Entry {
    pub fn title(&self) -> &str {
        match self {
            Entry::PendingCreate(pending) => &pending.title,
            Entry::Persisted(todo) => &todo.title,
        }
    }

    pub fn id(&self) -> Option<TodoId> {
        match self {
            Entry::PendingCreate(_) => None,
            Entry::Persisted(todo) => Some(todo.id),
        }
    }
}

/// An entry paired with whether its loader should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub entry: Entry,
    pub busy: bool,
}
