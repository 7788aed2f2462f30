use anyhow::anyhow;
use parking_lot::Mutex;
use pktodo_shared::{NewTodo, TodoPatch, TodoRecord};
use tracing::{debug, instrument};

use super::{ListQuery, RemoteStore};

/// In-process stand-in for the remote collection. Used by `--memory` and by
/// tests, which can also make the next calls fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<TodoRecord>,
    next_id: i64,
    failures_pending: usize,
    calls: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<TodoRecord>) -> Self {
        let next_id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(Inner {
                rows,
                next_id,
                failures_pending: 0,
                calls: 0,
            }),
        }
    }

    /// The next `count` calls fail without touching the rows.
    pub fn fail_next(&self, count: usize) {
        self.inner.lock().failures_pending = count;
    }

    /// Number of calls received so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.inner.lock().calls
    }

    pub fn rows(&self) -> Vec<TodoRecord> {
        self.inner.lock().rows.clone()
    }

    fn begin_call(&self, op: &str) -> anyhow::Result<parking_lot::MutexGuard<'_, Inner>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        if inner.failures_pending > 0 {
            inner.failures_pending -= 1;
            debug!(op, "injected failure");
            return Err(anyhow!("memory store: injected failure for {op}"));
        }
        Ok(inner)
    }
}

impl RemoteStore for MemoryStore {
    #[instrument(skip(self))]
    async fn list(&self, query: &ListQuery) -> anyhow::Result<Vec<TodoRecord>> {
        let inner = self.begin_call("list")?;
        let mut rows: Vec<TodoRecord> = inner
            .rows
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        debug!(count = rows.len(), "listed rows");
        Ok(rows)
    }

    #[instrument(skip(self, new))]
    async fn insert(&self, new: &NewTodo) -> anyhow::Result<TodoRecord> {
        let mut inner = self.begin_call("insert")?;
        let id = inner.next_id;
        inner.next_id += 1;
        let record = new.clone().into_record(id);
        inner.rows.push(record.clone());
        debug!(id, "inserted row");
        Ok(record)
    }

    // Like PostgREST, a filter that matches nothing is not an error.
    #[instrument(skip(self, patch))]
    async fn update(&self, id: i64, patch: &TodoPatch) -> anyhow::Result<()> {
        let mut inner = self.begin_call("update")?;
        if let Some(row) = inner.rows.iter_mut().find(|row| row.id == id) {
            patch.apply_to(row);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> anyhow::Result<()> {
        let mut inner = self.begin_call("delete")?;
        inner.rows.retain(|row| row.id != id);
        Ok(())
    }
}
