//! Storage service implementation
//!
//! Thin validating wrapper over the repository. Handlers talk to this
//! service; the matching engine and simulator talk to the repository
//! directly.

use std::sync::Arc;

use common::decimal::Quantity;
use common::error::{Error, ErrorExt, Result};
use common::model::provider::{EnergyProvider, NewEnergyProvider};
use common::model::request::{EnergyRequest, NewEnergyRequest};
use common::model::stats::{CommunityStats, CommunityStatsUpdate};
use common::model::transaction::EnergyTransaction;
use common::model::user::{NewUser, User};
use tracing::info;

use crate::repository::{GridRepository, InMemoryGridRepository, PostgresGridRepository};

/// Storage service for platform data
pub struct GridService {
    /// Repository for platform data
    repo: Arc<dyn GridRepository>,
}

/// Repository type selection
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl GridService {
    /// Create a new service backed by the in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryGridRepository::new()),
        }
    }

    /// Create a new service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn GridRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryGridRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresGridRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a service around an existing repository
    pub fn with_repo(repo: Arc<dyn GridRepository>) -> Self {
        Self { repo }
    }

    // User operations

    /// Register a new user, rejecting duplicate usernames and emails
    pub async fn register_user(&self, user: NewUser) -> Result<User> {
        info!("Registering user {}", user.username);

        if self
            .repo
            .get_user_by_username(&user.username)
            .await
            .with_context(|| format!("Failed to look up username {}", user.username))?
            .is_some()
        {
            return Err(Error::DuplicateUser(format!(
                "Username already exists: {}",
                user.username
            )));
        }

        if self
            .repo
            .get_user_by_email(&user.email)
            .await
            .with_context(|| format!("Failed to look up email {}", user.email))?
            .is_some()
        {
            return Err(Error::DuplicateUser(format!(
                "Email already exists: {}",
                user.email
            )));
        }

        self.repo.create_user(user).await
    }

    /// Authenticate a user by username and password.
    ///
    /// Plain credential comparison; trust is assumed to come from an outer
    /// layer, this is not a security boundary.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .repo
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| Error::InvalidCredentials("Invalid credentials".to_string()))?;

        if user.password != password {
            return Err(Error::InvalidCredentials("Invalid credentials".to_string()));
        }

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.repo.get_user(id).await
    }

    // Provider operations

    /// Register a new energy provider
    pub async fn register_provider(&self, provider: NewEnergyProvider) -> Result<EnergyProvider> {
        info!(
            "Registering provider {} for user {}",
            provider.provider_name, provider.user_id
        );

        if provider.max_capacity <= Quantity::ZERO {
            return Err(Error::ValidationError(
                "Provider max capacity must be positive".to_string(),
            ));
        }
        if provider.available_energy > provider.max_capacity {
            return Err(Error::ValidationError(
                "Available energy cannot exceed max capacity".to_string(),
            ));
        }

        self.repo.create_provider(provider).await
    }

    /// Get a provider by ID
    pub async fn get_provider(&self, id: i64) -> Result<Option<EnergyProvider>> {
        self.repo.get_provider(id).await
    }

    /// Get all providers owned by a user
    pub async fn providers_for_user(&self, user_id: i64) -> Result<Vec<EnergyProvider>> {
        self.repo.providers_by_user(user_id).await
    }

    /// Get active providers with available energy, most available first
    pub async fn matchable_providers(&self) -> Result<Vec<EnergyProvider>> {
        self.repo.matchable_providers().await
    }

    /// Overwrite a provider's energy figures and return the updated record
    pub async fn update_provider_energy(
        &self,
        id: i64,
        current_production: Quantity,
        available_energy: Quantity,
    ) -> Result<EnergyProvider> {
        self.repo
            .update_provider_energy(id, current_production, available_energy)
            .await
            .with_context(|| format!("Failed to update energy data for provider {}", id))?;

        self.repo
            .get_provider(id)
            .await?
            .ok_or_else(|| Error::ProviderNotFound(format!("Provider not found: {}", id)))
    }

    // Request operations

    /// Submit a new energy request
    pub async fn submit_request(&self, request: NewEnergyRequest) -> Result<EnergyRequest> {
        info!(
            "Submitting energy request for user {}: {} kWh",
            request.user_id, request.energy_amount
        );

        if request.energy_amount <= Quantity::ZERO {
            return Err(Error::ValidationError(
                "Requested energy amount must be positive".to_string(),
            ));
        }

        self.repo.create_request(request).await
    }

    /// Get all requests submitted by a user, newest first
    pub async fn requests_for_user(&self, user_id: i64) -> Result<Vec<EnergyRequest>> {
        self.repo.requests_by_user(user_id).await
    }

    /// Get all pending requests, newest first
    pub async fn pending_requests(&self) -> Result<Vec<EnergyRequest>> {
        self.repo.pending_requests().await
    }

    // Transaction operations

    /// Get all transactions where the user is the consumer, newest first
    pub async fn transactions_for_user(&self, user_id: i64) -> Result<Vec<EnergyTransaction>> {
        self.repo.transactions_by_consumer(user_id).await
    }

    /// Get the most recent transactions across the pool
    pub async fn recent_transactions(&self, limit: i64) -> Result<Vec<EnergyTransaction>> {
        self.repo.recent_transactions(limit).await
    }

    // Community stats operations

    /// Get the stats singleton, initializing a zeroed row on first access
    pub async fn community_stats(&self) -> Result<CommunityStats> {
        match self.repo.community_stats().await? {
            Some(stats) => Ok(stats),
            None => {
                self.repo
                    .upsert_community_stats(CommunityStatsUpdate::default())
                    .await
            }
        }
    }
}

impl Default for GridService {
    fn default() -> Self {
        Self::new()
    }
}
