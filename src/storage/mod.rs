pub mod catalog_source;
pub mod error;
pub mod export;
pub mod local_store;
pub mod object_store;
pub mod persistence;
pub mod records;
pub mod repo;
pub mod saved;
pub mod sqlite_repo;
