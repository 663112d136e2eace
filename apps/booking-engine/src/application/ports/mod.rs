//! Driven ports: interfaces the trade service requires from storage.
//!
//! Adapters implement these against the real engine (SQLite) or in memory
//! for tests. The write ports bundle the trade write and its audit entry
//! into one call so that the adapter can run both inside a single
//! transaction; there is no way to persist one without the other.

mod audit_recorder_port;
mod sequence_allocator_port;
mod trade_store_port;

pub use audit_recorder_port::AuditRecorder;
pub use sequence_allocator_port::SequenceAllocator;
pub use trade_store_port::TradeStore;
