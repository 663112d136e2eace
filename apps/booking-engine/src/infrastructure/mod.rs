//! Infrastructure layer - storage adapters and the HTTP driver adapter.

pub mod http;
pub mod persistence;
