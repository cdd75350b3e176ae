//! Direct access to the managers' SQLite catalogs.

pub mod models;
pub mod queries;
pub mod sqlite;

pub use sqlite::{CatalogDb, LIDARR_TABLES, SONARR_TABLES};
