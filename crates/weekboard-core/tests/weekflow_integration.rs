//! Integration tests for the weekly board workflow.
//!
//! These tests drive the public API end to end: session establishment,
//! panel mutations, carry-over between weeks, and durable storage
//! across restarts (simulated by reopening the SQLite store).

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;
use weekboard_core::{
    CarryOverOutcome, HabitsPanel, LocalIdentity, MemoryStore, PrioritiesPanel, Scope, Session,
    SqliteStore, UserId, WeekId, DAYS_IN_WEEK,
};

fn monday(y: i32, m: u32, d: u32) -> WeekId {
    WeekId::for_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn scope_for(user: &UserId) -> Scope {
    Scope::new("default-habit-tracker", user.clone())
}

#[tokio::test]
async fn test_full_week_lifecycle() {
    let dir = TempDir::new().unwrap();
    let identity = LocalIdentity::new(dir.path());
    let session = Session::establish(&identity, None).await.unwrap();

    let store = Arc::new(MemoryStore::new());
    let scope = scope_for(session.user_id());

    let week = monday(2025, 9, 1);
    let priorities = PrioritiesPanel::new(store.clone(), scope.clone());
    let habits = HabitsPanel::new(store.clone(), scope.clone(), week);

    // Fresh account: nothing to carry, nothing listed.
    assert_eq!(
        habits.activate().await.unwrap(),
        CarryOverOutcome::NothingToCarry
    );
    assert!(habits.list().await.unwrap().is_empty());

    // Fill the week.
    priorities.add("ship the quarterly report").await.unwrap();
    let passport = priorities.add("renew passport").await.unwrap();
    priorities.set_completed(&passport, true).await.unwrap();

    let gym = habits.add("gym").await.unwrap();
    habits.add("read 20 pages").await.unwrap();
    habits.toggle_day(&gym, 0).await.unwrap();
    habits.toggle_day(&gym, 2).await.unwrap();

    // Monday of the following week: habits carry over with reset
    // progress.
    let next = habits.for_week(week.next());
    assert_eq!(
        next.activate().await.unwrap(),
        CarryOverOutcome::Carried { count: 2 }
    );

    let carried = next.list().await.unwrap();
    assert_eq!(carried.len(), 2);
    assert!(carried.iter().all(|h| h.progress == [false; DAYS_IN_WEEK]));
    assert!(carried.iter().all(|h| h.week == next.week()));

    // Last week's records keep their checked days.
    let old = habits.list().await.unwrap();
    let old_gym = old.iter().find(|h| h.name == "gym").unwrap();
    assert!(old_gym.progress[0] && old_gym.progress[2]);

    // Priorities are week-independent.
    let listed = priorities.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(!listed[0].completed);
    assert!(listed[1].completed);

    // Activating the new week again changes nothing.
    assert_eq!(
        next.activate().await.unwrap(),
        CarryOverOutcome::AlreadyPopulated { existing: 2 }
    );
    assert_eq!(next.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_sqlite_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("store.db");
    let scope = scope_for(&UserId::new("anon-restart"));
    let week = monday(2025, 9, 1);

    {
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        let habits = HabitsPanel::new(store.clone(), scope.clone(), week);
        let id = habits.add("meditate").await.unwrap();
        habits.toggle_day(&id, 4).await.unwrap();

        let priorities = PrioritiesPanel::new(store, scope.clone());
        priorities.add("call the bank").await.unwrap();
    }

    // A fresh handle over the same file sees everything and can still
    // carry habits into a new week.
    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let habits = HabitsPanel::new(store.clone(), scope.clone(), week);
    let listed = habits.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "meditate");
    assert!(listed[0].progress[4]);

    let next = habits.for_week(week.next());
    assert_eq!(
        next.activate().await.unwrap(),
        CarryOverOutcome::Carried { count: 1 }
    );
    assert_eq!(next.list().await.unwrap()[0].progress, [false; DAYS_IN_WEEK]);

    let priorities = PrioritiesPanel::new(store, scope);
    assert_eq!(priorities.list().await.unwrap()[0].text, "call the bank");
}

#[tokio::test]
async fn test_live_feed_tracks_mutations() {
    let store = Arc::new(MemoryStore::new());
    let habits = HabitsPanel::new(
        store.clone(),
        scope_for(&UserId::new("anon-feed")),
        monday(2025, 9, 1),
    );

    let mut feed = habits.subscribe().await.unwrap();
    assert!(feed.recv().await.unwrap().is_empty());

    let id = habits.add("stretch").await.unwrap();
    let snapshot = feed.recv().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].name, "stretch");

    habits.toggle_day(&id, 6).await.unwrap();
    let snapshot = feed.recv().await.unwrap();
    assert!(snapshot[0].progress[6]);

    habits.remove(&id).await.unwrap();
    assert!(feed.recv().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_identities_partition_the_store() {
    let dir = TempDir::new().unwrap();
    let identity = LocalIdentity::new(dir.path());

    let anon = Session::establish(&identity, None).await.unwrap();
    let token = Session::establish(&identity, Some("team-secret"))
        .await
        .unwrap();
    assert_ne!(anon.user_id(), token.user_id());

    let store = Arc::new(MemoryStore::new());
    let anon_panel = PrioritiesPanel::new(store.clone(), scope_for(anon.user_id()));
    let token_panel = PrioritiesPanel::new(store.clone(), scope_for(token.user_id()));

    anon_panel.add("private note").await.unwrap();
    assert_eq!(anon_panel.list().await.unwrap().len(), 1);
    assert!(token_panel.list().await.unwrap().is_empty());

    // The same token resolves to the same user on a later run.
    let again = Session::establish(&identity, Some("team-secret"))
        .await
        .unwrap();
    assert_eq!(token.user_id(), again.user_id());
}
