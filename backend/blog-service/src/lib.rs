/// Blog Service Library
///
/// A multi-user blogging backend: posts filed under optional groups,
/// comments on posts, and a follow graph that drives a personal feed.
///
/// # Modules
///
/// - `handlers`: site pages, REST API, admin and health endpoints
/// - `models`: groups, posts, comments, follows and their request bodies
/// - `services`: business rules (follow graph, feed composer, content services)
/// - `db`: repository traits with Postgres and in-memory implementations
/// - `cache`: home page cache over Redis or an in-process map
/// - `middleware`: bearer-token identity, access policies, request metrics
/// - `pagination`: page-number and limit/offset slicing
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::{configure, AppState};
