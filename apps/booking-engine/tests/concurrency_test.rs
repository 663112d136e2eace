//! Concurrency properties of the reference generator and the write path.
//!
//! These tests run on a multi-threaded runtime so writers genuinely race:
//! uniqueness must come from the allocator's serialized read-modify-write,
//! not from scheduling luck.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use booking_engine::domain::trade::validation::TradeLimits;
use booking_engine::{
    Direction, SequenceAllocator, SqliteStore, TradeDraft, TradeService, TradeStatus, TradeUpdate,
};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use tokio::task::JoinSet;

const WRITERS: usize = 50;

type SqliteService = TradeService<SqliteStore, SqliteStore, SqliteStore>;

fn open_store(dir: &TempDir) -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::open(dir.path().join("trades.db"), Duration::from_secs(5))
            .expect("open store"),
    )
}

fn service(store: &Arc<SqliteStore>) -> Arc<SqliteService> {
    Arc::new(TradeService::new(
        Arc::clone(store),
        Arc::clone(store),
        Arc::clone(store),
        TradeLimits::default(),
    ))
}

fn draft(trade_date: NaiveDate) -> TradeDraft {
    TradeDraft {
        trade_date,
        value_date: trade_date + ChronoDuration::days(2),
        direction: Direction::Buy,
        base_currency: "EUR".to_string(),
        quote_currency: "USD".to_string(),
        base_amount: Some(dec!(250000.00)),
        exchange_rate: Some(dec!(1.085000)),
        quote_amount: None,
        counterparty: None,
        trader: None,
        notes: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_bookings_get_distinct_references() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let svc = service(&store);
    let today = Utc::now().date_naive();

    let mut tasks = JoinSet::new();
    for i in 0..WRITERS {
        let svc = Arc::clone(&svc);
        tasks.spawn(async move {
            svc.record_trade(draft(today), &format!("trader-{i}"))
                .await
                .expect("booking should succeed")
                .trade_reference
        });
    }

    let mut references = HashSet::new();
    while let Some(result) = tasks.join_next().await {
        references.insert(result.expect("task should not panic"));
    }

    assert_eq!(references.len(), WRITERS);

    let date_part = today.format("%Y%m%d").to_string();
    for sequence in 1..=WRITERS {
        let expected = format!("FX-{date_part}-{sequence:04}");
        assert!(references.contains(&expected), "missing {expected}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_allocations_are_gapless_and_unique() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..WRITERS {
        let store = Arc::clone(&store);
        tasks.spawn(async move { store.allocate(date).await.expect("allocation") });
    }

    let mut allocated = Vec::new();
    while let Some(result) = tasks.join_next().await {
        allocated.push(result.expect("task should not panic"));
    }

    allocated.sort_unstable();
    let expected: Vec<u32> = (1..=WRITERS as u32).collect();
    assert_eq!(allocated, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn allocators_for_different_dates_do_not_interfere() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let first = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    let second = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..40 {
        let store = Arc::clone(&store);
        let date = if i % 2 == 0 { first } else { second };
        tasks.spawn(async move { (date, store.allocate(date).await.expect("allocation")) });
    }

    let mut per_date: std::collections::HashMap<NaiveDate, Vec<u32>> =
        std::collections::HashMap::new();
    while let Some(result) = tasks.join_next().await {
        let (date, sequence) = result.expect("task should not panic");
        per_date.entry(date).or_default().push(sequence);
    }

    for (_, mut sequences) in per_date {
        sequences.sort_unstable();
        let expected: Vec<u32> = (1..=sequences.len() as u32).collect();
        assert_eq!(sequences, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_updates_never_lose_a_version() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let svc = service(&store);
    let today = Utc::now().date_naive();

    let booked = svc.record_trade(draft(today), "jsmith").await.unwrap();

    // Updates re-read before writing, so they serialize on the version
    // stamp; every successful update must land on a distinct version.
    let mut tasks = JoinSet::new();
    for i in 0..10 {
        let svc = Arc::clone(&svc);
        let id = booked.id;
        tasks.spawn(async move {
            svc.update_trade(
                id,
                TradeUpdate {
                    notes: Some(format!("pass {i}")),
                    ..TradeUpdate::default()
                },
                "ops",
            )
            .await
            .map(|t| t.version)
        });
    }

    let mut versions = Vec::new();
    while let Some(result) = tasks.join_next().await {
        if let Ok(version) = result.expect("task should not panic") {
            versions.push(version);
        }
    }

    let distinct: HashSet<i64> = versions.iter().copied().collect();
    assert_eq!(distinct.len(), versions.len(), "duplicate versions: {versions:?}");

    let final_state = svc.find_by_id(booked.id).await.unwrap();
    assert_eq!(final_state.version, 1 + versions.len() as i64);
    assert_eq!(final_state.status, TradeStatus::Pending);

    let history = svc.audit_history(booked.id).await.unwrap();
    assert_eq!(history.len(), 1 + versions.len());
}
