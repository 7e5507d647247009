//! Redis cache layer
//!
//! Read endpoints cache their assembled rule-group responses per provider
//! and section; every write to a section invalidates that section, and a
//! config upsert invalidates everything the provider owns.

use crate::config::RedisConfig;
use crate::error::{AppError, Result};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Cache key prefixes
mod keys {
    pub const PROVIDER_SECTION: &str = "payconf:provider";
}

/// Default TTLs
mod ttl {
    pub const PROVIDER_SECTION_SECS: u64 = 600; // 10 minutes
}

/// Config sections cached per provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Fields,
    Credentials,
    BankAccounts,
    StpRules,
    Restrictions,
}

impl Section {
    fn as_str(&self) -> &'static str {
        match self {
            Section::Fields => "fields",
            Section::Credentials => "credentials",
            Section::BankAccounts => "bank_accounts",
            Section::StpRules => "stp_rules",
            Section::Restrictions => "restrictions",
        }
    }
}

/// Cache manager for Redis operations
#[derive(Clone)]
pub struct CacheManager {
    conn: ConnectionManager,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { conn })
    }

    /// Round-trip check used by the readiness endpoint
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Get a value from cache
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => {
                let parsed = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Cache deserialize error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache with TTL
    async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache serialize error: {}", e)))?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs()).await?;
        Ok(())
    }

    /// Delete a key from cache
    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    /// Delete keys matching a pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS").arg(pattern).query_async(&mut conn).await?;

        if !keys.is_empty() {
            conn.del::<_, ()>(keys).await?;
        }
        Ok(())
    }

    /// Get one cached config section for a provider
    pub async fn get_section<T: DeserializeOwned>(
        &self,
        provider_code: &str,
        section: Section,
    ) -> Result<Option<T>> {
        let key = format!("{}:{}:{}", keys::PROVIDER_SECTION, provider_code, section.as_str());
        self.get(&key).await
    }

    /// Cache one config section for a provider
    pub async fn set_section<T: Serialize>(
        &self,
        provider_code: &str,
        section: Section,
        value: &T,
    ) -> Result<()> {
        let key = format!("{}:{}:{}", keys::PROVIDER_SECTION, provider_code, section.as_str());
        self.set(&key, value, Duration::from_secs(ttl::PROVIDER_SECTION_SECS))
            .await
    }

    /// Invalidate one config section for a provider
    pub async fn invalidate_section(&self, provider_code: &str, section: Section) -> Result<()> {
        let key = format!("{}:{}:{}", keys::PROVIDER_SECTION, provider_code, section.as_str());
        self.delete(&key).await
    }

    /// Invalidate everything cached for a provider (after a config upsert)
    pub async fn invalidate_provider(&self, provider_code: &str) -> Result<()> {
        let pattern = format!("{}:{}:*", keys::PROVIDER_SECTION, provider_code);
        self.delete_pattern(&pattern).await
    }
}
