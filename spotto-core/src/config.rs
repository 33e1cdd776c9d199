use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::GachaResult;

/// Well-known configuration keys. Values live in the config store and are
/// mutable at runtime; code never hardcodes them past a default.
pub mod keys {
    pub const CATEGORY_GACHA: &str = "gacha";
    pub const RARITY_WEIGHTS: &str = "rarity_weights";
    pub const EXCLUSION_THRESHOLD: &str = "exclusion_threshold";

    pub const CATEGORY_QUOTA: &str = "quota";
    pub const DAILY_DRAW_CAP: &str = "daily_draw_cap";

    pub const CATEGORY_REDEMPTION: &str = "redemption";
    pub const GRACE_MINUTES: &str = "grace_minutes";
}

/// Persistent key/value configuration, keyed by (category, key).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, category: &str, key: &str) -> GachaResult<Option<Value>>;
    async fn set(&self, category: &str, key: &str, value: Value) -> GachaResult<()>;
}

/// Read-through cache over a [`ConfigStore`]. Admin writes go through
/// [`ConfigService::set`], which invalidates the cached entry synchronously,
/// so a roll performed after the write always sees the new value.
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    cache: RwLock<HashMap<(String, String), Value>>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, category: &str, key: &str) -> GachaResult<Option<Value>> {
        let cache_key = (category.to_string(), key.to_string());
        if let Some(hit) = self.cache.read().await.get(&cache_key) {
            return Ok(Some(hit.clone()));
        }

        let value = self.store.get(category, key).await?;
        if let Some(ref v) = value {
            self.cache.write().await.insert(cache_key, v.clone());
        }
        Ok(value)
    }

    pub async fn set(&self, category: &str, key: &str, value: Value) -> GachaResult<()> {
        self.store.set(category, key, value).await?;
        self.invalidate(category, key).await;
        Ok(())
    }

    pub async fn invalidate(&self, category: &str, key: &str) {
        self.cache
            .write()
            .await
            .remove(&(category.to_string(), key.to_string()));
    }

    pub async fn get_i64(&self, category: &str, key: &str, default: i64) -> GachaResult<i64> {
        Ok(self
            .get(category, key)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(default))
    }
}
