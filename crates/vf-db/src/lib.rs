//! vf-db: persistence layer for transcode state and admitted jobs.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, typed models, and query modules for the transcode
//! state table and the job-admission table.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
