use super::DbClient;
use crate::errors::ApiError;
use crate::Result;
use redis::AsyncCommands;

impl DbClient {
    pub async fn set_cache(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut redis_conn = self.get_async_redis_conn().await.map_err(|err| {
            tracing::error!("Redis connection error: {}", err);
            ApiError::from(err)
        })?;
        redis_conn
            .set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|err| {
                tracing::error!("Redis SET failed: {}", err);
                ApiError::from(err)
            })?;
        tracing::info!("Cache set for key: {}", key);
        Ok(())
    }

    pub async fn get_cache(&self, key: &str) -> Result<String> {
        let mut redis_conn = self.get_async_redis_conn().await.map_err(|err| {
            tracing::error!("Redis connection error: {}", err);
            ApiError::from(err)
        })?;

        let value: Option<String> = redis_conn.get(key).await.map_err(|err| {
            tracing::error!("Redis GET failed: {}", err);
            ApiError::from(err)
        })?;

        value.ok_or_else(|| ApiError::NotFound(format!("Cache entry not found for key: {key}")))
    }

    pub async fn delete_cache(&self, key: &str) -> Result<()> {
        let mut redis_conn = self.get_async_redis_conn().await.map_err(|err| {
            tracing::error!("Redis connection error: {}", err);
            ApiError::from(err)
        })?;
        redis_conn.del::<_, ()>(key).await.map_err(|err| {
            tracing::error!("Redis DEL failed: {}", err);
            ApiError::from(err)
        })?;
        Ok(())
    }
}
