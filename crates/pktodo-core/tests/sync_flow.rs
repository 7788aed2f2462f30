use std::future::Future;

use chrono::{Duration, Utc};
use pktodo_core::controller::{Controller, ControllerSettings};
use pktodo_core::gateway::MemoryStore;
use pktodo_core::mutations::{Outcome, Rejection};
use pktodo_core::tabs::Tab;
use pktodo_shared::{Category, Importance, TodoRecord};

fn run_async<T>(future: impl Future<Output = T>) -> T {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
        .block_on(future)
}

fn row(id: i64, task: &str, category: Option<Category>) -> TodoRecord {
    TodoRecord {
        id,
        task: task.to_string(),
        done: false,
        due_at: None,
        category,
        importance: None,
    }
}

fn unlocked() -> Controller<MemoryStore> {
    let store = MemoryStore::with_rows(vec![
        row(1, "ประชุมชมรม", Some(Category::Activity)),
        row(2, "bot idea", Some(Category::Idea)),
        row(3, "Rust book ch.4", Some(Category::Learn)),
        row(4, "scholarship form", Some(Category::Fund)),
        row(5, "no type", None),
        row(6, "ค่ายอาสา", Some(Category::Activity)),
        row(7, "side project", Some(Category::Idea)),
    ]);
    let mut controller = Controller::new(store, ControllerSettings::default());
    run_async(controller.unlock("2548"));
    controller
}

fn ids(controller: &Controller<MemoryStore>) -> Vec<i64> {
    controller
        .state()
        .cache()
        .records()
        .iter()
        .map(|record| record.id)
        .collect()
}

#[test]
fn every_tab_holds_only_its_category_newest_first() {
    let mut controller = unlocked();

    for tab in Tab::BAR {
        assert_eq!(run_async(controller.select_tab(tab)), Outcome::Applied);
        let records = controller.state().cache().records();
        assert!(!records.is_empty(), "{tab} should have rows");
        assert!(records.iter().all(|record| record.category == tab.category()));
        assert!(records.windows(2).all(|pair| pair[0].id > pair[1].id));
    }

    run_async(controller.go_home());
    assert_eq!(ids(&controller), vec![7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn whitespace_only_create_makes_no_call() {
    let mut controller = unlocked();
    let calls = controller.store().call_count();
    let before = controller.state().cache().clone();

    controller.draft_mut().text = "  \n ".to_string();
    controller.draft_mut().importance = Some(Importance::Low);
    assert_eq!(run_async(controller.create()), Outcome::Rejected(Rejection::EmptyText));

    assert_eq!(controller.store().call_count(), calls);
    assert_eq!(controller.state().cache(), &before);
    assert_eq!(controller.state().draft().importance, Some(Importance::Low));
}

#[test]
fn create_puts_server_record_first_with_fresh_id() {
    let mut controller = unlocked();
    let due = Utc::now() + Duration::days(2);
    let existing = ids(&controller);
    {
        let draft = controller.draft_mut();
        draft.text = "Buy milk".to_string();
        draft.due_at = Some(due);
        draft.category = Some(Category::Activity);
        draft.importance = Some(Importance::High);
    }

    assert_eq!(run_async(controller.create()), Outcome::Applied);

    let first = controller.state().cache().records()[0].clone();
    assert_eq!(first.task, "Buy milk");
    assert!(!first.done);
    assert_eq!(first.due_at, Some(due));
    assert_eq!(first.category, Some(Category::Activity));
    assert_eq!(first.importance, Some(Importance::High));
    assert!(!existing.contains(&first.id));
    assert!(controller.store().rows().iter().any(|row| row.id == first.id));
}

#[test]
fn toggle_round_trip_and_pending_count() {
    let mut controller = unlocked();
    run_async(controller.go_home());
    let before = controller.state().cache().clone();
    let pending = controller.state().pending_count();

    assert_eq!(run_async(controller.toggle(3)), Outcome::Applied);
    let cache = controller.state().cache();
    assert!(cache.get(3).expect("record 3").done);
    assert_eq!(controller.state().pending_count(), pending - 1);
    for record in before.records().iter().filter(|record| record.id != 3) {
        assert_eq!(cache.get(record.id), Some(record));
    }

    assert_eq!(run_async(controller.toggle(3)), Outcome::Applied);
    assert_eq!(controller.state().cache(), &before);
    assert_eq!(controller.state().pending_count(), pending);
}

#[test]
fn failed_toggle_and_delete_leave_cache_alone() {
    let mut controller = unlocked();
    let before = controller.state().cache().clone();

    controller.store().fail_next(2);
    assert_eq!(run_async(controller.toggle(6)), Outcome::RemoteFailed);
    assert_eq!(run_async(controller.delete(6)), Outcome::RemoteFailed);
    assert_eq!(controller.state().cache(), &before);
}

#[test]
fn delete_removes_exactly_one_and_keeps_order() {
    let mut controller = unlocked();
    run_async(controller.go_home());

    assert_eq!(run_async(controller.delete(4)), Outcome::Applied);
    assert_eq!(ids(&controller), vec![7, 6, 5, 3, 2, 1]);
    assert!(controller.store().rows().iter().all(|row| row.id != 4));
}

#[test]
fn hidden_records_cannot_be_deleted_by_id() {
    let mut controller = unlocked();
    let stored = controller.store().rows().len();

    // The Activity tab holds 6 and 1; 3 lives under Learn.
    assert_eq!(run_async(controller.delete(3)), Outcome::Rejected(Rejection::UnknownId(3)));
    assert_eq!(controller.store().rows().len(), stored);

    run_async(controller.select_tab(Tab::Learn));
    assert_eq!(run_async(controller.delete(3)), Outcome::Applied);
    assert_eq!(controller.store().rows().len(), stored - 1);
}

#[test]
fn overlapping_toggles_settle_in_ack_order() {
    let mut controller = unlocked();
    run_async(controller.go_home());

    let first = controller.begin_toggle(1).expect("toggle 1");
    let second = controller.begin_toggle(2).expect("toggle 2");
    let (first_done, second_done) = run_async(async {
        let store = controller.store();
        tokio::join!(first.send(store), second.send(store))
    });

    // The second acknowledgment is applied before the first.
    assert_eq!(controller.apply(second_done), Outcome::Applied);
    assert!(controller.state().cache().get(2).expect("record 2").done);
    assert!(!controller.state().cache().get(1).expect("record 1").done);
    assert_eq!(controller.apply(first_done), Outcome::Applied);
    assert!(controller.state().cache().get(1).expect("record 1").done);
}

#[test]
fn rapid_double_toggle_of_one_record_is_not_serialized() {
    let mut controller = unlocked();

    // Both requests are built from the same cached flag, so both ask for
    // `done = true` and the record does not flip back.
    let a = controller.begin_toggle(6).expect("toggle");
    let b = controller.begin_toggle(6).expect("toggle");
    let (a_done, b_done) = run_async(async {
        let store = controller.store();
        tokio::join!(a.send(store), b.send(store))
    });
    controller.apply(a_done);
    controller.apply(b_done);

    assert!(controller.state().cache().get(6).expect("record 6").done);
    let stored = controller
        .store()
        .rows()
        .into_iter()
        .find(|row| row.id == 6)
        .expect("row 6");
    assert!(stored.done);
}

#[test]
fn overdue_follows_done_flag() {
    let now = Utc::now();
    let mut record = row(1, "late", Some(Category::Learn));
    record.due_at = Some(now - Duration::days(1));
    assert!(record.is_overdue(now));

    record.done = true;
    assert!(!record.is_overdue(now));
}
