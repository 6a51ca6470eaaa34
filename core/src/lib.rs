//! Client-side synchronization of a todo list with a remote CRUD API.
//!
//! # Overview
//! `SyncController` keeps an in-memory copy of one owner's todos in step with
//! the server. Each mutation waits for the server before touching local
//! state, marks the affected todo busy while its request is in flight, and
//! reports failures both as a returned `SyncError` and on a short-lived error
//! banner. Batch operations (toggle all, clear completed) fan out one request
//! per todo and report each outcome separately.
//!
//! # Design
//! - `TodoClient` is a stateless request builder / response parser
//!   (host-does-IO); `HttpTransport` executes its requests with `reqwest`.
//! - `Transport` is the async seam the controller depends on, so tests and
//!   other hosts can supply their own.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod busy;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod http;
pub mod notice;
pub mod store;
pub mod transport;
pub mod types;

pub use busy::{BusyKey, BusyTracker};
pub use client::TodoClient;
pub use config::{ConfigError, SyncConfig};
pub use controller::{BatchReport, RenameOutcome, SyncController};
pub use error::{ApiError, Operation, SyncError};
pub use filter::Filter;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use notice::ErrorBanner;
pub use store::TodoStore;
pub use transport::{HttpTransport, Transport};
pub use types::{CreateTodo, Entry, OwnerId, PendingTodo, Row, Todo, TodoId, UpdateTodo};
