pub mod config;
pub mod error;
pub mod models;
pub mod probes;
pub mod reports;
pub mod routes;
pub mod scanner;

pub use error::ScanError;
pub use routes::{router, AppState};
pub use scanner::{ExecutionStrategy, ScanReport, Scanner};
