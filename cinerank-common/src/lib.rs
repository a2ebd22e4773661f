//! # Cinerank Common Library
//!
//! Shared code for the cinerank service including:
//! - Domain models (RankItem, Category, PartitionKey)
//! - Event types (RankEvent enum) and EventBus
//! - Configuration loading
//! - Database initialization
//! - Error types

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::{Category, CategoryStats, PartitionKey, RankItem};
