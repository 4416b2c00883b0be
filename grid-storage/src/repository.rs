//! Repository for energy sharing data

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::decimal::Quantity;
use common::error::{Error, Result};
use common::model::provider::{EnergyProvider, EnergyType, NewEnergyProvider};
use common::model::request::{EnergyRequest, NewEnergyRequest, RequestStatus, UrgencyLevel};
use common::model::stats::{CommunityStats, CommunityStatsUpdate};
use common::model::transaction::{EnergyTransaction, NewEnergyTransaction, TransactionStatus};
use common::model::user::{NewUser, User, UserType};
use dashmap::DashMap;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Repository trait defining the interface for platform data storage.
///
/// Every getter returns an explicit `Option` for absence; bulk queries
/// return deterministically ordered vectors.
#[async_trait]
pub trait GridRepository: Send + Sync {
    // User operations

    /// Create a new user
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Get a user by ID
    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    /// Get a user by username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // Provider operations

    /// Create a new energy provider
    async fn create_provider(&self, provider: NewEnergyProvider) -> Result<EnergyProvider>;

    /// Get a provider by ID
    async fn get_provider(&self, id: i64) -> Result<Option<EnergyProvider>>;

    /// Get all providers owned by a user
    async fn providers_by_user(&self, user_id: i64) -> Result<Vec<EnergyProvider>>;

    /// Get all active providers, the simulation input set
    async fn active_providers(&self) -> Result<Vec<EnergyProvider>>;

    /// Get active providers with positive available energy, ordered by
    /// available energy descending (ties by ascending id)
    async fn matchable_providers(&self) -> Result<Vec<EnergyProvider>>;

    /// Overwrite a provider's production and availability figures
    async fn update_provider_energy(
        &self,
        id: i64,
        current_production: Quantity,
        available_energy: Quantity,
    ) -> Result<()>;

    /// Atomically decrement a provider's available energy.
    ///
    /// Returns the updated provider, or `None` when the provider is
    /// missing, inactive, or no longer has `amount` available. The check
    /// and the decrement happen as one storage operation, so concurrent
    /// debits cannot drive availability negative.
    async fn debit_available_energy(
        &self,
        id: i64,
        amount: Quantity,
    ) -> Result<Option<EnergyProvider>>;

    // Request operations

    /// Create a new energy request in state `pending`
    async fn create_request(&self, request: NewEnergyRequest) -> Result<EnergyRequest>;

    /// Get a request by ID
    async fn get_request(&self, id: i64) -> Result<Option<EnergyRequest>>;

    /// Get all requests submitted by a user, newest first
    async fn requests_by_user(&self, user_id: i64) -> Result<Vec<EnergyRequest>>;

    /// Get all pending requests, newest first
    async fn pending_requests(&self) -> Result<Vec<EnergyRequest>>;

    /// Transition a request to `matched` and bind the provider
    async fn mark_request_matched(&self, id: i64, provider_id: i64) -> Result<EnergyRequest>;

    // Transaction operations

    /// Create a new energy transaction
    async fn create_transaction(
        &self,
        transaction: NewEnergyTransaction,
    ) -> Result<EnergyTransaction>;

    /// Get a transaction by ID
    async fn get_transaction(&self, id: i64) -> Result<Option<EnergyTransaction>>;

    /// Get all transactions where the user is the consumer, newest first
    async fn transactions_by_consumer(&self, user_id: i64) -> Result<Vec<EnergyTransaction>>;

    /// Get the most recent transactions across the pool
    async fn recent_transactions(&self, limit: i64) -> Result<Vec<EnergyTransaction>>;

    // Community stats operations

    /// Get the stats singleton, if it has been written yet
    async fn community_stats(&self) -> Result<Option<CommunityStats>>;

    /// Upsert the stats singleton
    async fn upsert_community_stats(&self, stats: CommunityStatsUpdate) -> Result<CommunityStats>;
}

/// In-memory repository backed by concurrent maps
pub struct InMemoryGridRepository {
    pub users: DashMap<i64, User>,
    pub providers: DashMap<i64, EnergyProvider>,
    pub requests: DashMap<i64, EnergyRequest>,
    pub transactions: DashMap<i64, EnergyTransaction>,
    stats: RwLock<Option<CommunityStats>>,
    next_user_id: AtomicI64,
    next_provider_id: AtomicI64,
    next_request_id: AtomicI64,
    next_transaction_id: AtomicI64,
}

impl InMemoryGridRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            providers: DashMap::new(),
            requests: DashMap::new(),
            transactions: DashMap::new(),
            stats: RwLock::new(None),
            next_user_id: AtomicI64::new(1),
            next_provider_id: AtomicI64::new(1),
            next_request_id: AtomicI64::new(1),
            next_transaction_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryGridRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GridRepository for InMemoryGridRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            username: user.username,
            email: user.email,
            password: user.password,
            display_name: user.display_name,
            user_type: user.user_type,
            location: user.location,
            profile_image: user.profile_image,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.clone()))
    }

    async fn create_provider(&self, provider: NewEnergyProvider) -> Result<EnergyProvider> {
        let id = self.next_provider_id.fetch_add(1, Ordering::SeqCst);
        let provider = EnergyProvider {
            id,
            user_id: provider.user_id,
            provider_name: provider.provider_name,
            energy_type: provider.energy_type,
            max_capacity: provider.max_capacity,
            current_production: provider.current_production,
            available_energy: provider.available_energy,
            price_per_kwh: provider.price_per_kwh,
            latitude: provider.latitude,
            longitude: provider.longitude,
            is_active: provider.is_active,
            last_updated: Utc::now(),
        };
        self.providers.insert(id, provider.clone());
        Ok(provider)
    }

    async fn get_provider(&self, id: i64) -> Result<Option<EnergyProvider>> {
        Ok(self.providers.get(&id).map(|p| p.clone()))
    }

    async fn providers_by_user(&self, user_id: i64) -> Result<Vec<EnergyProvider>> {
        let mut providers: Vec<EnergyProvider> = self
            .providers
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        providers.sort_by_key(|p| p.id);
        Ok(providers)
    }

    async fn active_providers(&self) -> Result<Vec<EnergyProvider>> {
        let mut providers: Vec<EnergyProvider> = self
            .providers
            .iter()
            .filter(|entry| entry.is_active)
            .map(|entry| entry.clone())
            .collect();
        providers.sort_by_key(|p| p.id);
        Ok(providers)
    }

    async fn matchable_providers(&self) -> Result<Vec<EnergyProvider>> {
        let mut providers: Vec<EnergyProvider> = self
            .providers
            .iter()
            .filter(|entry| entry.is_active && entry.available_energy > Quantity::ZERO)
            .map(|entry| entry.clone())
            .collect();
        providers.sort_by(|a, b| {
            b.available_energy
                .cmp(&a.available_energy)
                .then(a.id.cmp(&b.id))
        });
        Ok(providers)
    }

    async fn update_provider_energy(
        &self,
        id: i64,
        current_production: Quantity,
        available_energy: Quantity,
    ) -> Result<()> {
        match self.providers.get_mut(&id) {
            Some(mut provider) => {
                provider.current_production = current_production;
                provider.available_energy = available_energy;
                provider.last_updated = Utc::now();
                Ok(())
            }
            None => Err(Error::ProviderNotFound(format!("Provider not found: {}", id))),
        }
    }

    async fn debit_available_energy(
        &self,
        id: i64,
        amount: Quantity,
    ) -> Result<Option<EnergyProvider>> {
        // The DashMap entry lock makes the check-and-decrement atomic
        match self.providers.get_mut(&id) {
            Some(mut provider) => {
                if !provider.is_active || provider.available_energy < amount {
                    return Ok(None);
                }
                provider.available_energy -= amount;
                provider.last_updated = Utc::now();
                Ok(Some(provider.clone()))
            }
            None => Ok(None),
        }
    }

    async fn create_request(&self, request: NewEnergyRequest) -> Result<EnergyRequest> {
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let request = EnergyRequest {
            id,
            user_id: request.user_id,
            energy_amount: request.energy_amount,
            urgency_level: request.urgency_level,
            preferred_time_slot: request.preferred_time_slot,
            max_price: request.max_price,
            status: RequestStatus::Pending,
            matched_provider_id: None,
            created_at: Utc::now(),
            requested_for: request.requested_for,
        };
        self.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: i64) -> Result<Option<EnergyRequest>> {
        Ok(self.requests.get(&id).map(|r| r.clone()))
    }

    async fn requests_by_user(&self, user_id: i64) -> Result<Vec<EnergyRequest>> {
        let mut requests: Vec<EnergyRequest> = self
            .requests
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn pending_requests(&self) -> Result<Vec<EnergyRequest>> {
        let mut requests: Vec<EnergyRequest> = self
            .requests
            .iter()
            .filter(|entry| entry.status == RequestStatus::Pending)
            .map(|entry| entry.clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn mark_request_matched(&self, id: i64, provider_id: i64) -> Result<EnergyRequest> {
        match self.requests.get_mut(&id) {
            Some(mut request) => {
                request.status = RequestStatus::Matched;
                request.matched_provider_id = Some(provider_id);
                Ok(request.clone())
            }
            None => Err(Error::RequestNotFound(format!("Request not found: {}", id))),
        }
    }

    async fn create_transaction(
        &self,
        transaction: NewEnergyTransaction,
    ) -> Result<EnergyTransaction> {
        let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
        let transaction = EnergyTransaction {
            id,
            request_id: transaction.request_id,
            provider_id: transaction.provider_id,
            consumer_id: transaction.consumer_id,
            energy_amount: transaction.energy_amount,
            price_per_kwh: transaction.price_per_kwh,
            total_price: transaction.total_price,
            status: transaction.status,
            start_time: None,
            end_time: None,
            created_at: Utc::now(),
        };
        self.transactions.insert(id, transaction.clone());
        Ok(transaction)
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<EnergyTransaction>> {
        Ok(self.transactions.get(&id).map(|t| t.clone()))
    }

    async fn transactions_by_consumer(&self, user_id: i64) -> Result<Vec<EnergyTransaction>> {
        let mut transactions: Vec<EnergyTransaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.consumer_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    async fn recent_transactions(&self, limit: i64) -> Result<Vec<EnergyTransaction>> {
        let mut transactions: Vec<EnergyTransaction> = self
            .transactions
            .iter()
            .map(|entry| entry.clone())
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        transactions.truncate(limit.max(0) as usize);
        Ok(transactions)
    }

    async fn community_stats(&self) -> Result<Option<CommunityStats>> {
        Ok(self.stats.read().await.clone())
    }

    async fn upsert_community_stats(&self, stats: CommunityStatsUpdate) -> Result<CommunityStats> {
        let mut guard = self.stats.write().await;
        let id = guard.as_ref().map(|s| s.id).unwrap_or(1);
        let updated = CommunityStats {
            id,
            total_production: stats.total_production,
            total_consumption: stats.total_consumption,
            active_providers: stats.active_providers,
            active_consumers: stats.active_consumers,
            current_flow_rate: stats.current_flow_rate,
            updated_at: Utc::now(),
        };
        *guard = Some(updated.clone());
        Ok(updated)
    }
}

/// PostgreSQL repository
pub struct PostgresGridRepository {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresGridRepository {
    /// Create a new PostgreSQL repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Create a repository from an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let user_type: String = row.try_get("user_type")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        display_name: row.try_get("display_name")?,
        user_type: UserType::from_str(&user_type)
            .ok_or_else(|| Error::Internal(format!("Unknown user type: {}", user_type)))?,
        location: row.try_get("location")?,
        profile_image: row.try_get("profile_image")?,
        created_at: row.try_get("created_at")?,
    })
}

fn provider_from_row(row: &PgRow) -> Result<EnergyProvider> {
    let energy_type: String = row.try_get("energy_type")?;
    Ok(EnergyProvider {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        provider_name: row.try_get("provider_name")?,
        energy_type: EnergyType::from_str(&energy_type)
            .ok_or_else(|| Error::Internal(format!("Unknown energy type: {}", energy_type)))?,
        max_capacity: row.try_get("max_capacity")?,
        current_production: row.try_get("current_production")?,
        available_energy: row.try_get("available_energy")?,
        price_per_kwh: row.try_get("price_per_kwh")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        is_active: row.try_get("is_active")?,
        last_updated: row.try_get("last_updated")?,
    })
}

fn request_from_row(row: &PgRow) -> Result<EnergyRequest> {
    let urgency: String = row.try_get("urgency_level")?;
    let status: String = row.try_get("status")?;
    Ok(EnergyRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        energy_amount: row.try_get("energy_amount")?,
        urgency_level: UrgencyLevel::from_str(&urgency)
            .ok_or_else(|| Error::Internal(format!("Unknown urgency level: {}", urgency)))?,
        preferred_time_slot: row.try_get("preferred_time_slot")?,
        max_price: row.try_get("max_price")?,
        status: RequestStatus::from_str(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown request status: {}", status)))?,
        matched_provider_id: row.try_get("matched_provider_id")?,
        created_at: row.try_get("created_at")?,
        requested_for: row.try_get("requested_for")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<EnergyTransaction> {
    let status: String = row.try_get("status")?;
    Ok(EnergyTransaction {
        id: row.try_get("id")?,
        request_id: row.try_get("request_id")?,
        provider_id: row.try_get("provider_id")?,
        consumer_id: row.try_get("consumer_id")?,
        energy_amount: row.try_get("energy_amount")?,
        price_per_kwh: row.try_get("price_per_kwh")?,
        total_price: row.try_get("total_price")?,
        status: TransactionStatus::from_str(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown transaction status: {}", status)))?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        created_at: row.try_get("created_at")?,
    })
}

fn stats_from_row(row: &PgRow) -> Result<CommunityStats> {
    Ok(CommunityStats {
        id: row.try_get("id")?,
        total_production: row.try_get("total_production")?,
        total_consumption: row.try_get("total_consumption")?,
        active_providers: row.try_get("active_providers")?,
        active_consumers: row.try_get("active_consumers")?,
        current_flow_rate: row.try_get("current_flow_rate")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl GridRepository for PostgresGridRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        debug!("Creating user {} in database", user.username);

        let row = sqlx::query(
            "INSERT INTO users (username, email, password, display_name, user_type, location, profile_image)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.display_name)
        .bind(user.user_type.as_str())
        .bind(&user.location)
        .bind(&user.profile_image)
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    async fn create_provider(&self, provider: NewEnergyProvider) -> Result<EnergyProvider> {
        debug!("Creating provider {} in database", provider.provider_name);

        let row = sqlx::query(
            "INSERT INTO energy_providers
                 (user_id, provider_name, energy_type, max_capacity, current_production,
                  available_energy, price_per_kwh, latitude, longitude, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(provider.user_id)
        .bind(&provider.provider_name)
        .bind(provider.energy_type.as_str())
        .bind(provider.max_capacity)
        .bind(provider.current_production)
        .bind(provider.available_energy)
        .bind(provider.price_per_kwh)
        .bind(provider.latitude)
        .bind(provider.longitude)
        .bind(provider.is_active)
        .fetch_one(&self.pool)
        .await?;

        provider_from_row(&row)
    }

    async fn get_provider(&self, id: i64) -> Result<Option<EnergyProvider>> {
        let row = sqlx::query("SELECT * FROM energy_providers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| provider_from_row(&r)).transpose()
    }

    async fn providers_by_user(&self, user_id: i64) -> Result<Vec<EnergyProvider>> {
        let rows = sqlx::query("SELECT * FROM energy_providers WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(provider_from_row).collect()
    }

    async fn active_providers(&self) -> Result<Vec<EnergyProvider>> {
        let rows = sqlx::query("SELECT * FROM energy_providers WHERE is_active = TRUE ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(provider_from_row).collect()
    }

    async fn matchable_providers(&self) -> Result<Vec<EnergyProvider>> {
        let rows = sqlx::query(
            "SELECT * FROM energy_providers
             WHERE is_active = TRUE AND available_energy > 0
             ORDER BY available_energy DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(provider_from_row).collect()
    }

    async fn update_provider_energy(
        &self,
        id: i64,
        current_production: Quantity,
        available_energy: Quantity,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE energy_providers
             SET current_production = $2, available_energy = $3, last_updated = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(current_production)
        .bind(available_energy)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ProviderNotFound(format!("Provider not found: {}", id)));
        }

        Ok(())
    }

    async fn debit_available_energy(
        &self,
        id: i64,
        amount: Quantity,
    ) -> Result<Option<EnergyProvider>> {
        // Guarded single-statement decrement; the WHERE clause makes the
        // check-and-decrement atomic under concurrent matches
        let row = sqlx::query(
            "UPDATE energy_providers
             SET available_energy = available_energy - $2, last_updated = now()
             WHERE id = $1 AND is_active = TRUE AND available_energy >= $2
             RETURNING *",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| provider_from_row(&r)).transpose()
    }

    async fn create_request(&self, request: NewEnergyRequest) -> Result<EnergyRequest> {
        debug!("Creating energy request for user {}", request.user_id);

        let row = sqlx::query(
            "INSERT INTO energy_requests
                 (user_id, energy_amount, urgency_level, preferred_time_slot, max_price, requested_for)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(request.user_id)
        .bind(request.energy_amount)
        .bind(request.urgency_level.as_str())
        .bind(&request.preferred_time_slot)
        .bind(request.max_price)
        .bind(request.requested_for)
        .fetch_one(&self.pool)
        .await?;

        request_from_row(&row)
    }

    async fn get_request(&self, id: i64) -> Result<Option<EnergyRequest>> {
        let row = sqlx::query("SELECT * FROM energy_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| request_from_row(&r)).transpose()
    }

    async fn requests_by_user(&self, user_id: i64) -> Result<Vec<EnergyRequest>> {
        let rows = sqlx::query(
            "SELECT * FROM energy_requests
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(request_from_row).collect()
    }

    async fn pending_requests(&self) -> Result<Vec<EnergyRequest>> {
        let rows = sqlx::query(
            "SELECT * FROM energy_requests
             WHERE status = 'pending'
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(request_from_row).collect()
    }

    async fn mark_request_matched(&self, id: i64, provider_id: i64) -> Result<EnergyRequest> {
        let row = sqlx::query(
            "UPDATE energy_requests
             SET status = 'matched', matched_provider_id = $2
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => request_from_row(&row),
            None => Err(Error::RequestNotFound(format!("Request not found: {}", id))),
        }
    }

    async fn create_transaction(
        &self,
        transaction: NewEnergyTransaction,
    ) -> Result<EnergyTransaction> {
        debug!(
            "Creating transaction for request {} and provider {}",
            transaction.request_id, transaction.provider_id
        );

        let row = sqlx::query(
            "INSERT INTO energy_transactions
                 (request_id, provider_id, consumer_id, energy_amount, price_per_kwh, total_price, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(transaction.request_id)
        .bind(transaction.provider_id)
        .bind(transaction.consumer_id)
        .bind(transaction.energy_amount)
        .bind(transaction.price_per_kwh)
        .bind(transaction.total_price)
        .bind(transaction.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        transaction_from_row(&row)
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<EnergyTransaction>> {
        let row = sqlx::query("SELECT * FROM energy_transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| transaction_from_row(&r)).transpose()
    }

    async fn transactions_by_consumer(&self, user_id: i64) -> Result<Vec<EnergyTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM energy_transactions
             WHERE consumer_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn recent_transactions(&self, limit: i64) -> Result<Vec<EnergyTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM energy_transactions
             ORDER BY created_at DESC, id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn community_stats(&self) -> Result<Option<CommunityStats>> {
        let row = sqlx::query("SELECT * FROM community_stats ORDER BY id LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| stats_from_row(&r)).transpose()
    }

    async fn upsert_community_stats(&self, stats: CommunityStatsUpdate) -> Result<CommunityStats> {
        // Upsert logic - update the singleton if present, insert otherwise
        let existing = self.community_stats().await?;

        let row = match existing {
            Some(current) => {
                sqlx::query(
                    "UPDATE community_stats
                     SET total_production = $2, total_consumption = $3, active_providers = $4,
                         active_consumers = $5, current_flow_rate = $6, updated_at = now()
                     WHERE id = $1
                     RETURNING *",
                )
                .bind(current.id)
                .bind(stats.total_production)
                .bind(stats.total_consumption)
                .bind(stats.active_providers)
                .bind(stats.active_consumers)
                .bind(stats.current_flow_rate)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "INSERT INTO community_stats
                         (total_production, total_consumption, active_providers, active_consumers, current_flow_rate)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING *",
                )
                .bind(stats.total_production)
                .bind(stats.total_consumption)
                .bind(stats.active_providers)
                .bind(stats.active_consumers)
                .bind(stats.current_flow_rate)
                .fetch_one(&self.pool)
                .await?
            }
        };

        stats_from_row(&row)
    }
}
