pub mod postgres;
pub mod profile_store;
pub mod redis;

pub use postgres::create_pool;
pub use profile_store::{InMemoryProfileStore, PgProfileStore, ProfileStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;
