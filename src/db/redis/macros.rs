/// Read-through caching for provider fetches.
///
/// Checks the cache for `$key`; on a hit the cached value is returned, on a
/// miss `$block` computes the value, which is queued for caching with the
/// given TTL and returned.
///
/// # Arguments
/// * `$cache`: a [`crate::db::Cache`] instance.
/// * `$key`: the [`crate::db::CacheKey`] to cache under.
/// * `$ttl`: time-to-live for the cached value in seconds.
/// * `$block`: async block computing the value on a cache miss.
///
/// # Example
/// ```rust,ignore
/// let anime = cached!(self.cache, key, 3600, async move {
///     self.fetch_from_api(&genres).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
