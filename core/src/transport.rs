//! The async seam between the controller and the remote store.
//!
//! # Design
//! `Transport` is the only thing the controller knows about the network.
//! `HttpTransport` is the production implementation: it asks `TodoClient`
//! for an `HttpRequest`, executes it with `reqwest`, and hands the
//! `HttpResponse` back to `TodoClient` for parsing. Tests plug in scripted
//! in-memory transports instead.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, OwnerId, Todo, TodoId, UpdateTodo};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn list(&self, owner_id: OwnerId) -> Result<Vec<Todo>, ApiError>;

    async fn create(&self, input: &CreateTodo) -> Result<Todo, ApiError>;

    async fn update(&self, input: &UpdateTodo) -> Result<Todo, ApiError>;

    async fn delete(&self, id: TodoId) -> Result<(), ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn list(&self, owner_id: OwnerId) -> Result<Vec<Todo>, ApiError> {
        (**self).list(owner_id).await
    }

    async fn create(&self, input: &CreateTodo) -> Result<Todo, ApiError> {
        (**self).create(input).await
    }

    async fn update(&self, input: &UpdateTodo) -> Result<Todo, ApiError> {
        (**self).update(input).await
    }

    async fn delete(&self, id: TodoId) -> Result<(), ApiError> {
        (**self).delete(id).await
    }
}

/// `Transport` over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: TodoClient,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            client: TodoClient::new(base_url),
            http,
        }
    }

    async fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        tracing::trace!(target: "todo_sync::transport", method = req.method.as_str(), path = %req.path, "sending");

        let mut builder = self.http.request(method, &req.path);
        for (key, value) in &req.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::trace!(target: "todo_sync::transport", status, "received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn list(&self, owner_id: OwnerId) -> Result<Vec<Todo>, ApiError> {
        let response = self.execute(self.client.build_list_todos(owner_id)).await?;
        self.client.parse_list_todos(response)
    }

    async fn create(&self, input: &CreateTodo) -> Result<Todo, ApiError> {
        let req = self.client.build_create_todo(input)?;
        let response = self.execute(req).await?;
        self.client.parse_create_todo(response)
    }

    async fn update(&self, input: &UpdateTodo) -> Result<Todo, ApiError> {
        let req = self.client.build_update_todo(input)?;
        let response = self.execute(req).await?;
        self.client.parse_update_todo(response)
    }

    async fn delete(&self, id: TodoId) -> Result<(), ApiError> {
        let response = self.execute(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)
    }
}
