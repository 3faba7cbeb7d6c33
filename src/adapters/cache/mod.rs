//! In-process caches.

mod cached_role_lookup;
mod ttl_cache;

pub use cached_role_lookup::CachedRoleLookup;
pub use ttl_cache::TtlCache;
