use sqlx::{PgPool, migrate::Migrator};

use crate::cache::CacheService;

/// Embedded migrations under `saphy-database/migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Shared PostgreSQL handle with its optional cache.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    cache: CacheService,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self::with_cache(pool, CacheService::disabled("saphy:prod"))
    }

    pub fn with_cache(pool: PgPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }
}
