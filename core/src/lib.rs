pub mod backup;
pub mod config;
pub mod document;
pub mod errors;

pub use backup::BackupStore;
pub use config::AppConfig;
pub use document::{DocumentKind, DocumentStore};
