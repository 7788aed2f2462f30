//! Create, toggle and delete as remote call + local follow-up.
//!
//! A [`Request`] is built from the current state, sent on its own, and the
//! resulting [`Completion`] is handed back to the controller. The cache is
//! only touched after the store has acknowledged the call, so overlapping
//! requests settle in acknowledgment order.

use std::fmt;

use chrono::{DateTime, Utc};
use pktodo_shared::{Category, Importance, NewTodo, TodoPatch, TodoRecord};
use tracing::{instrument, warn};

use crate::cache::TaskCache;
use crate::gateway::RemoteStore;

/// The four inputs of the creation form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub text: String,
    pub due_at: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    pub importance: Option<Importance>,
}

impl Draft {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn to_new_todo(&self) -> NewTodo {
        NewTodo {
            task: self.text.clone(),
            done: false,
            due_at: self.due_at,
            category: self.category.clone(),
            importance: self.importance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Locked,
    EmptyText,
    UnknownId(i64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Locked => f.write_str("gate is locked"),
            Rejection::EmptyText => f.write_str("task text is empty"),
            Rejection::UnknownId(id) => write!(f, "no task with id {id} in view"),
        }
    }
}

/// What a transition did. Front ends may ignore everything but `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected(Rejection),
    RemoteFailed,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Create(NewTodo),
    Toggle { id: i64, done: bool },
    Delete { id: i64 },
}

impl Request {
    pub fn create(draft: &Draft) -> Result<Self, Rejection> {
        if draft.is_blank() {
            return Err(Rejection::EmptyText);
        }
        Ok(Request::Create(draft.to_new_todo()))
    }

    /// Targets the inverse of the cached flag.
    pub fn toggle(cache: &TaskCache, id: i64) -> Result<Self, Rejection> {
        let record = cache.get(id).ok_or(Rejection::UnknownId(id))?;
        Ok(Request::Toggle {
            id,
            done: !record.done,
        })
    }

    /// Only records on screen can be deleted.
    pub fn delete(cache: &TaskCache, id: i64) -> Result<Self, Rejection> {
        cache.get(id).ok_or(Rejection::UnknownId(id))?;
        Ok(Request::Delete { id })
    }

    #[instrument(skip(store))]
    pub async fn send<S: RemoteStore>(self, store: &S) -> Completion {
        match self {
            Request::Create(new) => Completion::Created(store.insert(&new).await),
            Request::Toggle { id, done } => Completion::Toggled {
                id,
                done,
                result: store.update(id, &TodoPatch::done(done)).await,
            },
            Request::Delete { id } => Completion::Deleted {
                id,
                result: store.delete(id).await,
            },
        }
    }
}

#[derive(Debug)]
pub enum Completion {
    Created(anyhow::Result<TodoRecord>),
    Toggled {
        id: i64,
        done: bool,
        result: anyhow::Result<()>,
    },
    Deleted {
        id: i64,
        result: anyhow::Result<()>,
    },
}

impl Completion {
    /// Cache side of an acknowledged call. Failed calls leave the cache
    /// as it is.
    pub fn apply_to(self, cache: &mut TaskCache) -> Outcome {
        match self {
            Completion::Created(Ok(record)) => {
                cache.prepend(record);
                Outcome::Applied
            }
            Completion::Created(Err(err)) => {
                warn!(error = %format!("{err:#}"), "insert failed");
                Outcome::RemoteFailed
            }
            Completion::Toggled {
                id,
                done,
                result: Ok(()),
            } => {
                if !cache.set_done(id, done) {
                    warn!(id, "toggled record is no longer in view");
                }
                Outcome::Applied
            }
            Completion::Toggled { id, result: Err(err), .. } => {
                warn!(id, error = %format!("{err:#}"), "update failed");
                Outcome::RemoteFailed
            }
            Completion::Deleted { id, result: Ok(()) } => {
                cache.remove(id);
                Outcome::Applied
            }
            Completion::Deleted { id, result: Err(err) } => {
                warn!(id, error = %format!("{err:#}"), "delete failed");
                Outcome::RemoteFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use pktodo_shared::Category;

    use super::*;
    use crate::gateway::MemoryStore;
    use crate::testing::{record, run_async};

    #[test]
    fn blank_draft_is_rejected_before_any_request() {
        let mut draft = Draft {
            text: "   \t".to_string(),
            ..Draft::default()
        };
        assert_eq!(Request::create(&draft), Err(Rejection::EmptyText));

        draft.text = "  Buy milk ".to_string();
        let Ok(Request::Create(new)) = Request::create(&draft) else {
            panic!("expected a create request");
        };
        assert_eq!(new.task, "  Buy milk ");
        assert!(!new.done);
    }

    #[test]
    fn toggle_targets_inverse_of_cached_flag() {
        let mut done = record(2, "b", None);
        done.done = true;
        let cache = TaskCache::new(vec![record(1, "a", None), done]);

        assert_eq!(
            Request::toggle(&cache, 1),
            Ok(Request::Toggle { id: 1, done: true })
        );
        assert_eq!(
            Request::toggle(&cache, 2),
            Ok(Request::Toggle { id: 2, done: false })
        );
        assert_eq!(Request::toggle(&cache, 3), Err(Rejection::UnknownId(3)));
    }

    #[test]
    fn delete_needs_the_record_in_view() {
        let cache = TaskCache::new(vec![record(1, "a", None)]);
        assert_eq!(Request::delete(&cache, 1), Ok(Request::Delete { id: 1 }));
        assert_eq!(Request::delete(&cache, 9), Err(Rejection::UnknownId(9)));
    }

    #[test]
    fn failed_completions_leave_cache_unchanged() {
        let mut cache = TaskCache::new(vec![record(1, "a", Some(Category::Idea))]);
        let before = cache.clone();

        let outcomes = [
            Completion::Created(Err(anyhow!("offline"))).apply_to(&mut cache),
            Completion::Toggled {
                id: 1,
                done: true,
                result: Err(anyhow!("offline")),
            }
            .apply_to(&mut cache),
            Completion::Deleted {
                id: 1,
                result: Err(anyhow!("offline")),
            }
            .apply_to(&mut cache),
        ];

        assert!(outcomes.iter().all(|outcome| *outcome == Outcome::RemoteFailed));
        assert_eq!(cache, before);
    }

    #[test]
    fn send_talks_to_the_store() {
        let store = MemoryStore::with_rows(vec![record(1, "a", None)]);
        let completion = run_async(Request::Toggle { id: 1, done: true }.send(&store));
        let mut cache = TaskCache::new(vec![record(1, "a", None)]);
        assert_eq!(completion.apply_to(&mut cache), Outcome::Applied);
        assert!(cache.get(1).expect("record").done);
        assert!(store.rows()[0].done);
    }
}
