//! Local copy of the remote list.
//!
//! Holds persisted todos in the order they arrived plus the placeholder for a
//! create in flight. Knows nothing about the network; the controller decides
//! when each mutation happens.

use crate::types::{PendingTodo, Todo, TodoId};

#[derive(Debug, Default, Clone)]
pub struct TodoStore {
    todos: Vec<Todo>,
    temp: Option<PendingTodo>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, keeping the given order.
    pub fn load(&mut self, todos: Vec<Todo>) {
        self.todos = todos;
    }

    /// Append a persisted todo. An id already present is replaced in place
    /// so ids stay unique.
    pub fn insert(&mut self, todo: Todo) {
        if let Some(existing) = self.todos.iter_mut().find(|t| t.id == todo.id) {
            tracing::warn!(target: "todo_sync::store", id = todo.id, "insert of an id already present, replacing");
            *existing = todo;
            return;
        }
        self.todos.push(todo);
    }

    /// Replace the todo with `id`. Returns false if it is not present.
    pub fn replace(&mut self, id: TodoId, todo: Todo) -> bool {
        match self.todos.iter_mut().find(|t| t.id == id) {
            Some(existing) => {
                *existing = todo;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: TodoId) -> Option<Todo> {
        let index = self.todos.iter().position(|t| t.id == id)?;
        Some(self.todos.remove(index))
    }

    pub fn set_temp(&mut self, temp: Option<PendingTodo>) {
        self.temp = temp;
    }

    pub fn temp(&self) -> Option<&PendingTodo> {
        self.temp.as_ref()
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// True for a non-empty list where every todo is completed.
    pub fn is_all_completed(&self) -> bool {
        !self.todos.is_empty() && self.todos.iter().all(|t| t.completed)
    }

    pub fn has_completed(&self) -> bool {
        self.todos.iter().any(|t| t.completed)
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_ids(&self) -> Vec<TodoId> {
        self.todos
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id)
            .collect()
    }
}
