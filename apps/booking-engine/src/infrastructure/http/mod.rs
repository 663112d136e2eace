//! HTTP driver adapter: a thin JSON API over the trade service.

mod controller;
mod request;
mod response;

pub use controller::{create_router, AppState};
pub use request::ListTradesQuery;
pub use response::{ErrorResponse, HealthResponse};
