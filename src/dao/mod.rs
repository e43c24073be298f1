//! Persistence layer: entity models, storage traits, and backends.

pub mod game_store;
pub mod models;
pub mod storage;
