//! Reconciles the local todo list with the remote store.
//!
//! # Design
//! `SyncController` owns the `TodoStore`, the `BusyTracker` and the error
//! banner behind one `std::sync::Mutex`. The lock is only taken between
//! awaits, never across one, so every store/busy update is applied as a unit
//! and operations on different todos can be awaited concurrently from the
//! same task (`join_all` in the batch operations).
//!
//! Busy markers are owned by an `InFlight` guard. The guard is settled in
//! the same critical section that applies the transport result; if the
//! operation future is dropped first, the guard's `Drop` releases the
//! markers instead, so no todo stays busy after its operation is gone.
//!
//! Nothing is applied optimistically: the store only changes once the
//! transport has answered, and a failure leaves it as it was.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::join_all;

use crate::busy::{BusyKey, BusyTracker};
use crate::config::SyncConfig;
use crate::error::{ApiError, Operation, SyncError};
use crate::filter::{self, Filter};
use crate::notice::ErrorBanner;
use crate::store::TodoStore;
use crate::transport::{HttpTransport, Transport};
use crate::types::{Entry, OwnerId, PendingTodo, Row, Todo, TodoId, UpdateTodo};

const TARGET: &str = "todo_sync::controller";

#[derive(Debug)]
struct SyncState {
    store: TodoStore,
    busy: BusyTracker,
    banner: ErrorBanner,
    loading: bool,
}

/// Result of a rename request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The trimmed title matched the current one; nothing was sent.
    Unchanged,
    Renamed(Todo),
    /// The trimmed title was empty, so the todo was deleted.
    Deleted,
}

/// Per-item outcome of a batch operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<TodoId>,
    pub failed: Vec<SyncError>,
    /// Ids left out because another operation on them was already in flight.
    pub skipped: Vec<TodoId>,
}

impl BatchReport {
    fn from_results(results: Vec<Result<TodoId, SyncError>>, skipped: Vec<TodoId>) -> Self {
        let mut report = BatchReport {
            skipped,
            ..BatchReport::default()
        };
        for result in results {
            match result {
                Ok(id) => report.succeeded.push(id),
                Err(err) => report.failed.push(err),
            }
        }
        report
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<TodoId> {
        self.failed.iter().filter_map(SyncError::todo_id).collect()
    }
}

fn lock(state: &Mutex<SyncState>) -> MutexGuard<'_, SyncState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn release(state: &mut SyncState, keys: Vec<BusyKey>) {
    for key in keys {
        if key == BusyKey::PendingCreate {
            state.store.set_temp(None);
        }
        state.busy.mark_idle(key);
    }
}

/// Log a failure, put it on the banner, and hand it back.
fn fail(state: &mut SyncState, err: SyncError) -> SyncError {
    tracing::warn!(target: TARGET, id = ?err.todo_id(), error = ?err, "{err}");
    state.banner.raise(err.to_string());
    err
}

/// Busy markers held by one request.
struct InFlight<'a> {
    state: &'a Mutex<SyncState>,
    keys: Vec<BusyKey>,
}

impl<'a> InFlight<'a> {
    /// Wrap keys that the caller has already marked busy.
    fn new(state: &'a Mutex<SyncState>, keys: Vec<BusyKey>) -> Self {
        Self { state, keys }
    }

    /// Release the markers inside a critical section the caller already holds.
    fn settle(mut self, state: &mut SyncState) {
        release(state, std::mem::take(&mut self.keys));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.keys.is_empty() {
            return;
        }
        let keys = std::mem::take(&mut self.keys);
        tracing::debug!(target: TARGET, ?keys, "request dropped before settling");
        release(&mut lock(self.state), keys);
    }
}

/// Keeps `loading` raised for the lifetime of a list request.
struct LoadingFlag<'a> {
    state: &'a Mutex<SyncState>,
    armed: bool,
}

impl<'a> LoadingFlag<'a> {
    fn raise(state: &'a Mutex<SyncState>) -> Self {
        lock(state).loading = true;
        Self { state, armed: true }
    }

    fn settle(mut self, state: &mut SyncState) {
        self.armed = false;
        state.loading = false;
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).loading = false;
        }
    }
}

pub struct SyncController<T> {
    transport: T,
    owner_id: OwnerId,
    request_timeout: Option<Duration>,
    state: Mutex<SyncState>,
}

impl SyncController<HttpTransport> {
    /// Controller talking HTTP to `config.base_url`.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(HttpTransport::new(&config.base_url), config)
    }
}

impl<T: Transport> SyncController<T> {
    pub fn new(transport: T, config: &SyncConfig) -> Self {
        Self {
            transport,
            owner_id: config.owner_id,
            request_timeout: config.request_timeout(),
            state: Mutex::new(SyncState {
                store: TodoStore::new(),
                busy: BusyTracker::new(),
                banner: ErrorBanner::new(config.notice_ttl()),
                loading: false,
            }),
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        lock(&self.state)
    }

    async fn call<F, R>(&self, request: F) -> Result<R, ApiError>
    where
        F: Future<Output = Result<R, ApiError>>,
    {
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ApiError::TimedOut(limit))?,
            None => request.await,
        }
    }

    /// Fetch the owner's list and replace the store with it. Returns the
    /// number of todos loaded.
    pub async fn load(&self) -> Result<usize, SyncError> {
        let loading = LoadingFlag::raise(&self.state);
        let result = self.call(self.transport.list(self.owner_id)).await;

        let mut state = self.lock();
        loading.settle(&mut state);
        match result {
            Ok(todos) => {
                let count = todos.len();
                state.store.load(todos);
                tracing::info!(target: TARGET, owner_id = self.owner_id, count, "loaded");
                Ok(count)
            }
            Err(source) => Err(fail(&mut state, SyncError::network(Operation::Load, None, source))),
        }
    }

    /// Create a todo from `title`, trimmed. The placeholder is visible
    /// through `temp_todo` until the server answers.
    pub async fn create(&self, title: &str) -> Result<Todo, SyncError> {
        let title = title.trim();
        let (pending, in_flight) = {
            let mut state = self.lock();
            if title.is_empty() {
                state.banner.dismiss();
                return Err(fail(&mut state, SyncError::Validation));
            }
            if !state.busy.mark_busy(BusyKey::PendingCreate) {
                return Err(SyncError::CreateInFlight);
            }
            state.banner.dismiss();
            let pending = PendingTodo::new(title, self.owner_id);
            state.store.set_temp(Some(pending.clone()));
            (pending, InFlight::new(&self.state, vec![BusyKey::PendingCreate]))
        };

        tracing::debug!(target: TARGET, title = %pending.title, "create");
        let result = self.call(self.transport.create(&pending.to_create())).await;

        let mut state = self.lock();
        in_flight.settle(&mut state);
        match result {
            Ok(todo) => {
                state.store.insert(todo.clone());
                Ok(todo)
            }
            Err(source) => Err(fail(&mut state, SyncError::network(Operation::Create, None, source))),
        }
    }

    pub async fn delete(&self, id: TodoId) -> Result<(), SyncError> {
        let in_flight = {
            let mut state = self.lock();
            if !state.busy.mark_busy(BusyKey::Todo(id)) {
                tracing::debug!(target: TARGET, id, "delete rejected, busy");
                return Err(SyncError::Busy(id));
            }
            InFlight::new(&self.state, vec![BusyKey::Todo(id)])
        };
        tracing::debug!(target: TARGET, id, "delete");
        self.finish_delete(Operation::Delete, id, in_flight).await.map(|_| ())
    }

    /// Flip `completed` on one todo.
    pub async fn toggle(&self, id: TodoId) -> Result<Todo, SyncError> {
        let (input, in_flight) = {
            let mut state = self.lock();
            let current = state.store.get(id).ok_or(SyncError::Unknown(id))?;
            let input = UpdateTodo {
                completed: !current.completed,
                ..UpdateTodo::from(current)
            };
            if !state.busy.mark_busy(BusyKey::Todo(id)) {
                tracing::debug!(target: TARGET, id, "toggle rejected, busy");
                return Err(SyncError::Busy(id));
            }
            state.banner.dismiss();
            (input, InFlight::new(&self.state, vec![BusyKey::Todo(id)]))
        };
        tracing::debug!(target: TARGET, id, completed = input.completed, "toggle");
        self.finish_update(Operation::Toggle, input, in_flight).await
    }

    /// Rename a todo. An empty trimmed title deletes it; an unchanged one
    /// sends nothing. On failure the caller should keep its editor open.
    pub async fn rename(&self, id: TodoId, title: &str) -> Result<RenameOutcome, SyncError> {
        let title = title.trim();
        if title.is_empty() {
            self.delete(id).await?;
            return Ok(RenameOutcome::Deleted);
        }

        let (input, in_flight) = {
            let mut state = self.lock();
            let current = state.store.get(id).ok_or(SyncError::Unknown(id))?;
            if current.title == title {
                return Ok(RenameOutcome::Unchanged);
            }
            let input = UpdateTodo {
                title: title.to_string(),
                ..UpdateTodo::from(current)
            };
            if !state.busy.mark_busy(BusyKey::Todo(id)) {
                tracing::debug!(target: TARGET, id, "rename rejected, busy");
                return Err(SyncError::Busy(id));
            }
            (input, InFlight::new(&self.state, vec![BusyKey::Todo(id)]))
        };
        tracing::debug!(target: TARGET, id, "rename");
        self.finish_update(Operation::Rename, input, in_flight)
            .await
            .map(RenameOutcome::Renamed)
    }

    /// Complete every incomplete todo, or, when all are already completed,
    /// mark them all incomplete. One request per affected todo, in parallel.
    pub async fn toggle_all(&self) -> BatchReport {
        let (target, work, skipped) = {
            let mut state = self.lock();
            let all_completed = state.store.is_all_completed();
            let target = !all_completed;
            let affected: Vec<UpdateTodo> = state
                .store
                .todos()
                .iter()
                .filter(|todo| all_completed || !todo.completed)
                .map(|todo| UpdateTodo {
                    completed: target,
                    ..UpdateTodo::from(todo)
                })
                .collect();
            let marked = state.busy.mark_busy_many(affected.iter().map(|input| input.id));
            let (accepted, rejected): (Vec<UpdateTodo>, Vec<UpdateTodo>) = affected
                .into_iter()
                .partition(|input| marked.contains(&input.id));
            let work: Vec<(UpdateTodo, InFlight<'_>)> = accepted
                .into_iter()
                .map(|input| {
                    let in_flight = InFlight::new(&self.state, vec![BusyKey::Todo(input.id)]);
                    (input, in_flight)
                })
                .collect();
            (target, work, rejected.into_iter().map(|input| input.id).collect())
        };

        tracing::debug!(target: TARGET, completed = target, count = work.len(), ?skipped, "toggle all");
        let requests = work.into_iter().map(|(input, in_flight)| async move {
            let id = input.id;
            self.finish_update(Operation::ToggleAll, input, in_flight)
                .await
                .map(|_| id)
        });
        BatchReport::from_results(join_all(requests).await, skipped)
    }

    /// Delete every todo that is completed right now, in parallel. Todos
    /// completed after this call starts are not included.
    pub async fn clear_completed(&self) -> BatchReport {
        let (work, skipped) = {
            let mut state = self.lock();
            let completed = state.store.completed_ids();
            let marked = state.busy.mark_busy_many(completed.iter().copied());
            let skipped: Vec<TodoId> = completed
                .into_iter()
                .filter(|id| !marked.contains(id))
                .collect();
            let work: Vec<(TodoId, InFlight<'_>)> = marked
                .into_iter()
                .map(|id| (id, InFlight::new(&self.state, vec![BusyKey::Todo(id)])))
                .collect();
            (work, skipped)
        };

        tracing::debug!(target: TARGET, count = work.len(), ?skipped, "clear completed");
        let requests = work
            .into_iter()
            .map(|(id, in_flight)| self.finish_delete(Operation::ClearCompleted, id, in_flight));
        BatchReport::from_results(join_all(requests).await, skipped)
    }

    async fn finish_update(
        &self,
        op: Operation,
        input: UpdateTodo,
        in_flight: InFlight<'_>,
    ) -> Result<Todo, SyncError> {
        let result = self.call(self.transport.update(&input)).await.and_then(|updated| {
            if updated.id == input.id {
                Ok(updated)
            } else {
                Err(ApiError::DeserializationError(format!(
                    "update of todo {} answered with todo {}",
                    input.id, updated.id
                )))
            }
        });

        let mut state = self.lock();
        in_flight.settle(&mut state);
        match result {
            Ok(updated) => {
                state.store.replace(input.id, updated.clone());
                Ok(updated)
            }
            Err(source) => Err(fail(&mut state, SyncError::network(op, Some(input.id), source))),
        }
    }

    async fn finish_delete(
        &self,
        op: Operation,
        id: TodoId,
        in_flight: InFlight<'_>,
    ) -> Result<TodoId, SyncError> {
        let result = self.call(self.transport.delete(id)).await;

        let mut state = self.lock();
        in_flight.settle(&mut state);
        match result {
            Ok(()) => {
                state.store.remove(id);
                Ok(id)
            }
            Err(source) => Err(fail(&mut state, SyncError::network(op, Some(id), source))),
        }
    }

    pub fn current_todos(&self) -> Vec<Todo> {
        self.lock().store.todos().to_vec()
    }

    pub fn temp_todo(&self) -> Option<PendingTodo> {
        self.lock().store.temp().cloned()
    }

    pub fn is_busy(&self, id: TodoId) -> bool {
        self.lock().busy.is_busy(id)
    }

    pub fn is_creating(&self) -> bool {
        self.lock().busy.is_creating()
    }

    pub fn busy_ids(&self) -> Vec<TodoId> {
        self.lock().busy.busy_ids()
    }

    pub fn visible_todos(&self, mode: Filter) -> Vec<Todo> {
        let state = self.lock();
        filter::project(state.store.todos(), mode)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Visible todos with their loader state, followed by the placeholder for
    /// a create in flight, if any. The placeholder is shown under every filter.
    pub fn rows(&self, mode: Filter) -> Vec<Row> {
        let state = self.lock();
        let mut rows: Vec<Row> = filter::project(state.store.todos(), mode)
            .into_iter()
            .map(|todo| Row {
                busy: state.busy.is_busy(todo.id),
                entry: Entry::Persisted(todo.clone()),
            })
            .collect();
        if let Some(pending) = state.store.temp() {
            rows.push(Row {
                entry: Entry::PendingCreate(pending.clone()),
                busy: state.busy.is_creating(),
            });
        }
        rows
    }

    pub fn error_message(&self) -> Option<String> {
        self.lock().banner.current().map(str::to_string)
    }

    pub fn dismiss_error(&self) {
        self.lock().banner.dismiss();
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn is_all_completed(&self) -> bool {
        self.lock().store.is_all_completed()
    }

    pub fn has_completed(&self) -> bool {
        self.lock().store.has_completed()
    }

    pub fn active_count(&self) -> usize {
        self.lock().store.active_count()
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_report_splits_results() {
        let report = BatchReport::from_results(
            vec![
                Ok(1),
                Err(SyncError::network(Operation::ToggleAll, Some(2), ApiError::NotFound)),
                Ok(3),
            ],
            vec![4],
        );
        assert_eq!(report.succeeded, vec![1, 3]);
        assert_eq!(report.failed_ids(), vec![2]);
        assert_eq!(report.skipped, vec![4]);
        assert!(!report.is_success());
        assert!(BatchReport::default().is_success());
    }

    #[test]
    fn release_clears_placeholder_with_its_marker() {
        let mut state = SyncState {
            store: TodoStore::new(),
            busy: BusyTracker::new(),
            banner: ErrorBanner::new(Duration::from_secs(3)),
            loading: false,
        };
        state.store.set_temp(Some(PendingTodo::new("x", 1)));
        state.busy.mark_busy(BusyKey::PendingCreate);
        state.busy.mark_busy(BusyKey::Todo(5));

        release(&mut state, vec![BusyKey::PendingCreate]);
        assert!(state.store.temp().is_none());
        assert!(!state.busy.is_creating());
        assert!(state.busy.is_busy(5));
    }

    #[test]
    fn dropped_in_flight_releases_markers() {
        let state = Mutex::new(SyncState {
            store: TodoStore::new(),
            busy: BusyTracker::new(),
            banner: ErrorBanner::new(Duration::from_secs(3)),
            loading: false,
        });
        lock(&state).busy.mark_busy_many([1, 2]);
        let guard = InFlight::new(&state, vec![BusyKey::Todo(1), BusyKey::Todo(2)]);
        drop(guard);
        assert!(lock(&state).busy.is_idle());
    }
}
