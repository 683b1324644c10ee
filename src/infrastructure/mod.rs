// Infrastructure - persistence and caching

pub mod cache;
pub mod database;
pub mod sqlite_database;

pub use cache::FieldCache;
pub use database::FieldStore;
pub use sqlite_database::SqliteFieldStore;
