pub mod api;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod llm;
pub mod models;
pub mod service;
pub mod validation;

pub use config::AppConfig;
pub use db::{create_pool, ensure_schema, MemoryRequestStore, PgRequestStore, RequestStore};
pub use error::{AppError, AppResult};
pub use service::{CommodityClassifier, OfferExtractor, OfferIntake, RequestService};
