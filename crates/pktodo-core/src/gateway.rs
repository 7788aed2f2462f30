//! Access to the remote `todos` collection.
//!
//! The store is authoritative; everything on this side of the trait is a
//! view of it. Every failure, transport or store-side, comes back as a
//! plain `anyhow::Error`.

pub mod http;
pub mod memory;

use std::future::Future;

use pktodo_shared::{Category, NewTodo, TodoPatch, TodoRecord};

pub use http::HttpStore;
pub use memory::MemoryStore;

/// Query for [`RemoteStore::list`]. Results always come back ordered by id,
/// newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub category: Option<Category>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
        }
    }

    pub fn matches(&self, record: &TodoRecord) -> bool {
        match self.category.as_ref() {
            Some(category) => record.category.as_ref() == Some(category),
            None => true,
        }
    }
}

pub trait RemoteStore {
    fn list(&self, query: &ListQuery) -> impl Future<Output = anyhow::Result<Vec<TodoRecord>>>;

    fn insert(&self, new: &NewTodo) -> impl Future<Output = anyhow::Result<TodoRecord>>;

    fn update(&self, id: i64, patch: &TodoPatch) -> impl Future<Output = anyhow::Result<()>>;

    fn delete(&self, id: i64) -> impl Future<Output = anyhow::Result<()>>;
}
