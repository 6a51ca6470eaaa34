use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub title: String,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// PATCH body. The client sends the full entity, but only the fields present
/// are applied; `id` in the body is ignored in favour of the path.
#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

/// In-memory table. Ids are handed out from a monotonically increasing
/// counter, so iterating the `BTreeMap` yields insertion order.
#[derive(Debug, Default)]
pub struct Table {
    last_id: i64,
    todos: BTreeMap<i64, Todo>,
}

impl Table {
    pub fn insert(&mut self, title: String, completed: bool, user_id: i64) -> Todo {
        self.last_id += 1;
        let todo = Todo {
            id: self.last_id,
            user_id,
            title,
            completed,
        };
        self.todos.insert(todo.id, todo.clone());
        todo
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

pub type Db = Arc<RwLock<Table>>;

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Build the router over an existing table so tests can seed or inspect it.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", patch(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

async fn list_todos(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<Todo>> {
    let table = db.read().await;
    let todos: Vec<Todo> = table
        .todos
        .values()
        .filter(|todo| query.user_id.map_or(true, |user_id| todo.user_id == user_id))
        .cloned()
        .collect();
    tracing::debug!(target: "mock_server", user_id = ?query.user_id, count = todos.len(), "list");
    Json(todos)
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> (StatusCode, Json<Todo>) {
    let todo = db
        .write()
        .await
        .insert(input.title, input.completed, input.user_id);
    tracing::debug!(target: "mock_server", id = todo.id, "create");
    (StatusCode::CREATED, Json(todo))
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut table = db.write().await;
    let todo = table.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    if let Some(user_id) = input.user_id {
        todo.user_id = user_id;
    }
    tracing::debug!(target: "mock_server", id, "update");
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut table = db.write().await;
    let removed = table.todos.remove(&id);
    tracing::debug!(target: "mock_server", id, found = removed.is_some(), "delete");
    removed.map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}
