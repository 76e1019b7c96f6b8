//! Connection pool construction

use docurag_config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

const CONNECT_TIMEOUT_SECONDS: u64 = 30;
const IDLE_TIMEOUT_SECONDS: u64 = 600;
const MAX_LIFETIME_SECONDS: u64 = 1800;

/// Owns the `PostgreSQL` connection pool backing the metadata store.
#[derive(Clone)]
pub struct PoolManager {
    pool: PgPool,
}

impl PoolManager {
    /// Connect using the given configuration.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable, credentials are
    /// rejected, or the connection pool cannot be established within the
    /// configured timeout.
    pub async fn new(db_config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECONDS))
            .max_lifetime(Duration::from_secs(MAX_LIFETIME_SECONDS))
            .connect(&db_config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Borrow the underlying pool.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pool statistics for health/diagnostics endpoints.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
            max: self.pool.options().get_max_connections(),
        }
    }

    /// Close the pool, draining in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connection pool statistics.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max: u32,
}

impl PoolStats {
    /// Percentage of the pool currently checked out.
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        let in_use = self.size.saturating_sub(self.idle) as f32;
        (in_use / self.max as f32) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_of_empty_pool_is_zero() {
        let stats = PoolStats {
            size: 0,
            idle: 0,
            max: 10,
        };
        assert!((stats.utilization() - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn utilization_reflects_checked_out_connections() {
        let stats = PoolStats {
            size: 10,
            idle: 5,
            max: 10,
        };
        assert!((stats.utilization() - 50.0).abs() < f32::EPSILON);
    }
}
