//! Convenience wrapper combining pool construction and the repository

use docurag_config::DatabaseConfig;

use crate::pool_manager::PoolManager;
use crate::repository::PgMetaDataRepository;

/// Owns the connection pool and the repository built on top of it.
pub struct DataClient {
    pools: PoolManager,
    repository: PgMetaDataRepository,
}

impl DataClient {
    /// Connect and build the repository.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or authentication fails.
    pub async fn initialize(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pools = PoolManager::new(config).await?;
        let repository = PgMetaDataRepository::new(pools.clone());
        Ok(Self { pools, repository })
    }

    pub const fn repository(&self) -> &PgMetaDataRepository {
        &self.repository
    }

    pub const fn pools(&self) -> &PoolManager {
        &self.pools
    }
}
