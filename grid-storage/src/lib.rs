//! Persistence gateway for the energy sharing platform
//!
//! Exposes typed CRUD over the five record kinds (users, providers,
//! requests, transactions, community stats) behind the [`GridRepository`]
//! trait, with an in-memory implementation for tests and a PostgreSQL
//! implementation for production.

pub mod locks;
pub mod repository;
pub mod service;

pub use locks::ProviderLockRegistry;
pub use repository::{GridRepository, InMemoryGridRepository, PostgresGridRepository};
pub use service::{GridService, RepositoryType};
