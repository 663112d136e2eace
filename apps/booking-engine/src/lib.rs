// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Booking Engine - Rust Core Library
//!
//! Records foreign-exchange spot trades with an immutable audit trail under
//! strict correctness requirements: a concurrency-safe, date-scoped trade
//! reference generator and a write path that produces exactly one audit
//! record per mutation, serialized against a single-writer storage engine.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic with no I/O
//!   - `trade`: the trade entity, value objects, validation predicates,
//!     forward-only status state machine, domain errors
//!   - `audit`: immutable before/after audit entries and snapshot capture
//!
//! - **Application**: Orchestration over ports
//!   - `ports`: `SequenceAllocator`, `TradeStore`, `AuditRecorder`
//!   - `services`: `TradeService` — validate, allocate, derive, persist and
//!     audit inside one atomic unit of work
//!
//! - **Infrastructure**: Adapters
//!   - `persistence`: SQLite (WAL, serialized writes) and in-memory stores
//!   - `http`: axum JSON API delegating to the trade service

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - core business logic with no I/O.
pub mod domain;

/// Application layer - ports and the trade service.
pub mod application;

/// Infrastructure layer - storage adapters and the HTTP API.
pub mod infrastructure;

/// Typed configuration loaded from YAML.
pub mod config;

/// Tracing initialization.
pub mod telemetry;

pub use application::ports::{AuditRecorder, SequenceAllocator, TradeStore};
pub use application::services::{TradeFilter, TradeService};
pub use domain::audit::{AuditAction, TradeAudit};
pub use domain::trade::{
    Trade, TradeDraft, TradeError, TradeUpdate, Direction, TradeStatus,
};
pub use infrastructure::persistence::{InMemoryStore, SqliteStore};
