use super::Store;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Create an in-memory store for testing.
async fn test_store() -> Store {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    Store::run_migrations(&pool).await.unwrap();
    Store { pool }
}

const DAY: &str = "2026-03-14";
const NEXT_DAY: &str = "2026-03-15";

// --- users ---

#[tokio::test]
async fn test_ensure_user_idempotent() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    store.ensure_user("u1").await.unwrap();
    assert_eq!(store.user_count().await.unwrap(), 1);

    let user = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.utc_offset_min, 0);
}

#[tokio::test]
async fn test_set_offset_in_range() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    store.set_utc_offset("u1", 120).await.unwrap();
    assert_eq!(store.get_user("u1").await.unwrap().unwrap().utc_offset_min, 120);
}

#[tokio::test]
async fn test_set_offset_out_of_range_rejected() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    assert!(store.set_utc_offset("u1", 841).await.is_err());
    assert!(store.set_utc_offset("u1", -721).await.is_err());
    assert_eq!(store.get_user("u1").await.unwrap().unwrap().utc_offset_min, 0);
}

// --- quota ledger ---

#[tokio::test]
async fn test_reserve_exactly_limit_succeeds() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();

    let mut ok = 0;
    let mut denied = 0;
    for _ in 0..25 {
        if store.reserve_ai_call("u1", DAY, 20).await.unwrap() {
            ok += 1;
        } else {
            denied += 1;
        }
    }
    assert_eq!(ok, 20);
    assert_eq!(denied, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reserve_limit_holds_across_connections() {
    // Reservations racing over separate pool connections must still stop at
    // the limit; the single conditional UPDATE is the only admission point.
    let dir = tempfile::TempDir::new().unwrap();
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("quota.db"))
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(opts)
        .await
        .unwrap();
    Store::run_migrations(&pool).await.unwrap();
    let store = Store { pool };
    store.ensure_user("u1").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..25 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.reserve_ai_call("u1", DAY, 20).await.unwrap()
        }));
    }

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap() {
            ok += 1;
        }
    }
    assert_eq!(ok, 20);
    assert!(!store.reserve_ai_call("u1", DAY, 20).await.unwrap());
}

#[tokio::test]
async fn test_reserve_resets_on_new_local_day() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();

    for _ in 0..3 {
        assert!(store.reserve_ai_call("u1", DAY, 3).await.unwrap());
    }
    assert!(!store.reserve_ai_call("u1", DAY, 3).await.unwrap());

    // A different local date resets the counter to 1 in the same statement.
    assert!(store.reserve_ai_call("u1", NEXT_DAY, 3).await.unwrap());
    let (count,): (i64,) = sqlx::query_as("SELECT ai_calls_today FROM users WHERE chat_id = 'u1'")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_rollback_restores_pre_reservation_count() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();

    assert!(store.reserve_ai_call("u1", DAY, 20).await.unwrap());
    assert!(store.reserve_ai_call("u1", DAY, 20).await.unwrap());
    store.rollback_ai_call("u1").await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT ai_calls_today FROM users WHERE chat_id = 'u1'")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1, "reserve then rollback is net zero");
}

#[tokio::test]
async fn test_rollback_floors_at_zero() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    store.rollback_ai_call("u1").await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT ai_calls_today FROM users WHERE chat_id = 'u1'")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_help_quota_independent_of_ai_quota() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();

    for _ in 0..5 {
        assert!(store.reserve_help_call("u1", DAY, 5).await.unwrap());
    }
    assert!(!store.reserve_help_call("u1", DAY, 5).await.unwrap());

    // Main budget untouched.
    assert!(store.reserve_ai_call("u1", DAY, 20).await.unwrap());
}

#[tokio::test]
async fn test_reserve_unknown_user_fails() {
    let store = test_store().await;
    assert!(!store.reserve_ai_call("ghost", DAY, 20).await.unwrap());
}

// --- idempotency guard ---

#[tokio::test]
async fn test_claim_daily_event_fires_once() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();

    assert!(store.claim_daily_event("u1", "daily_summary", DAY).await.unwrap());
    assert!(!store.claim_daily_event("u1", "daily_summary", DAY).await.unwrap());

    // Different day and different type are independent claims.
    assert!(store.claim_daily_event("u1", "daily_summary", NEXT_DAY).await.unwrap());
    assert!(store.claim_daily_event("u1", "morning_greeting", DAY).await.unwrap());
}

// --- reminder claims ---

#[tokio::test]
async fn test_claim_due_reminders_inside_window_once() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    // 09:00 task; sweep runs at 08:50 with an 8..22 minute look-ahead.
    store.create_task("u1", DAY, 540, "Study Go").await.unwrap();

    let claimed = store.claim_due_reminders("u1", DAY, 530 + 8, 530 + 22).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].1, "Study Go");

    // An overlapping sweep sees nothing.
    let again = store.claim_due_reminders("u1", DAY, 530 + 8, 530 + 22).await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_claim_due_reminders_window_bounds() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    store.create_task("u1", DAY, 500, "too early").await.unwrap();
    store.create_task("u1", DAY, 600, "too late").await.unwrap();
    store.create_task("u1", DAY, 545, "in window").await.unwrap();

    let claimed = store.claim_due_reminders("u1", DAY, 538, 552).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].1, "in window");
}

#[tokio::test]
async fn test_claim_due_reminders_scoped_to_date_and_user() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    store.ensure_user("u2").await.unwrap();
    store.create_task("u1", DAY, 540, "mine today").await.unwrap();
    store.create_task("u1", NEXT_DAY, 540, "mine tomorrow").await.unwrap();
    store.create_task("u2", DAY, 540, "theirs").await.unwrap();

    let claimed = store.claim_due_reminders("u1", DAY, 530, 560).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].1, "mine today");
}

// --- terminal transitions ---

#[tokio::test]
async fn test_claim_terminal_exclusive() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    let id = store.create_task("u1", DAY, 540, "Study Go").await.unwrap();
    store.claim_due_reminders("u1", DAY, 500, 600).await.unwrap();

    assert!(store.claim_terminal(&id, true).await.unwrap());
    // Any further terminal claim loses, in either direction.
    assert!(!store.claim_terminal(&id, true).await.unwrap());
    assert!(!store.claim_terminal(&id, false).await.unwrap());

    let tasks = store.tasks_for_date("u1", DAY).await.unwrap();
    assert!(tasks[0].praised);
    assert!(!tasks[0].scolded);
}

#[tokio::test]
async fn test_claim_terminal_requires_reminded() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    let id = store.create_task("u1", DAY, 540, "Study Go").await.unwrap();

    // Still Planned — no terminal transition possible.
    assert!(!store.claim_terminal(&id, false).await.unwrap());
}

#[tokio::test]
async fn test_feedback_candidates_window_and_state() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    let a = store.create_task("u1", DAY, 540, "a").await.unwrap();
    let _b = store.create_task("u1", DAY, 540, "b planned").await.unwrap();
    let c = store.create_task("u1", DAY, 400, "c outside").await.unwrap();

    // Remind a and c only.
    for id in [&a, &c] {
        sqlx::query("UPDATE tasks SET reminder_sent = 1 WHERE id = ?")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();
    }

    // now = 550, lag 3..25 → window 525..547.
    let candidates = store.feedback_candidates("u1", DAY, 525, 547).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, a);

    // Terminal tasks drop out.
    store.claim_terminal(&a, false).await.unwrap();
    let candidates = store.feedback_candidates("u1", DAY, 525, 547).await.unwrap();
    assert!(candidates.is_empty());
}

// --- response side-channel ---

#[tokio::test]
async fn test_record_response_latest_pending_once() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    store.create_task("u1", DAY, 540, "Study Go").await.unwrap();
    store.create_task("u1", DAY, 600, "Write report").await.unwrap();
    store.claim_due_reminders("u1", DAY, 0, 1439).await.unwrap();

    let matched = store.record_response("u1", DAY, "doing go study").await.unwrap();
    assert_eq!(matched.as_deref(), Some("Write report"), "latest reminded task wins");

    // Second reply lands on the remaining unresponded task.
    let matched = store.record_response("u1", DAY, "now the report").await.unwrap();
    assert_eq!(matched.as_deref(), Some("Study Go"));

    // Nothing pending left.
    assert!(store.record_response("u1", DAY, "again").await.unwrap().is_none());
}

#[tokio::test]
async fn test_record_response_requires_reminded() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    store.create_task("u1", DAY, 540, "Study Go").await.unwrap();

    assert!(store.record_response("u1", DAY, "doing it").await.unwrap().is_none());
}

// --- rollover ---

#[tokio::test]
async fn test_rollover_resets_lifecycle_and_is_idempotent() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    let id = store.create_task("u1", DAY, 540, "Study Go").await.unwrap();
    store.claim_due_reminders("u1", DAY, 0, 1439).await.unwrap();
    store.record_response("u1", DAY, "done").await.unwrap();
    store.claim_terminal(&id, false).await.unwrap();

    let reset = store.rollover_before("u1", NEXT_DAY).await.unwrap();
    assert_eq!(reset, 1);

    let task = &store.tasks_for_date("u1", DAY).await.unwrap()[0];
    assert!(!task.reminder_sent);
    assert!(!task.praised);
    assert!(!task.scolded);
    assert!(task.user_response.is_none());

    // Re-run: no-op.
    assert_eq!(store.rollover_before("u1", NEXT_DAY).await.unwrap(), 0);
}

#[tokio::test]
async fn test_rollover_ignores_current_date() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    let id = store.create_task("u1", DAY, 540, "Study Go").await.unwrap();
    store.claim_due_reminders("u1", DAY, 0, 1439).await.unwrap();
    store.claim_terminal(&id, true).await.unwrap();

    // Rollover for the same date touches nothing (strictly-before predicate).
    assert_eq!(store.rollover_before("u1", DAY).await.unwrap(), 0);
    assert!(store.tasks_for_date("u1", DAY).await.unwrap()[0].praised);
}

// --- counts & stats ---

#[tokio::test]
async fn test_day_counts() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();
    let a = store.create_task("u1", DAY, 540, "a").await.unwrap();
    store.create_task("u1", DAY, 600, "b").await.unwrap();
    store.create_task("u1", DAY, 660, "c").await.unwrap();
    store.claim_due_reminders("u1", DAY, 0, 1439).await.unwrap();
    store.claim_terminal(&a, true).await.unwrap();

    let (planned, completed) = store.day_counts("u1", DAY).await.unwrap();
    assert_eq!(planned, 3);
    assert_eq!(completed, 1);

    let (planned, _) = store.day_counts("u1", NEXT_DAY).await.unwrap();
    assert_eq!(planned, 0);
}

#[tokio::test]
async fn test_stats_default_and_upsert() {
    let store = test_store().await;
    store.ensure_user("u1").await.unwrap();

    let stats = store.get_stats("u1").await.unwrap();
    assert_eq!(stats.current_streak, 0);
    assert!(stats.last_summary_date.is_none());

    store.upsert_stats("u1", 2, 5, Some(DAY), DAY).await.unwrap();
    let stats = store.get_stats("u1").await.unwrap();
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.longest_streak, 5);
    assert_eq!(stats.last_success_date.as_deref(), Some(DAY));
    assert_eq!(stats.last_summary_date.as_deref(), Some(DAY));

    // Upsert replaces the whole row.
    store.upsert_stats("u1", 0, 5, Some(DAY), NEXT_DAY).await.unwrap();
    let stats = store.get_stats("u1").await.unwrap();
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.last_summary_date.as_deref(), Some(NEXT_DAY));
}
