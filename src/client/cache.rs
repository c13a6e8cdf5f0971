use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::client::clock::Clock;
use crate::modules::relationship::model::DerivedStatus;

pub const STATUS_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    pub status: DerivedStatus,
    pub stored_at: Instant,
}

/// Per-session derived-status cache, keyed by target account. Instantiated
/// once per session with an injected clock; not an ambient singleton. `get`
/// only answers while the entry is younger than the TTL; `set` always
/// overwrites the timestamp.
pub struct StatusCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: HashMap<Uuid, CacheEntry>,
}

impl StatusCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, STATUS_TTL)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { ttl, clock, entries: HashMap::new() }
    }

    pub fn get(&self, target: &Uuid) -> Option<DerivedStatus> {
        let entry = self.entries.get(target)?;
        if self.clock.now().duration_since(entry.stored_at) < self.ttl {
            Some(entry.status)
        } else {
            None
        }
    }

    pub fn set(&mut self, target: Uuid, status: DerivedStatus) {
        self.entries.insert(target, CacheEntry { status, stored_at: self.clock.now() });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::clock::ManualClock;

    fn cache() -> (StatusCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (StatusCache::new(clock.clone()), clock)
    }

    #[test]
    fn get_returns_fresh_entries() {
        let (mut cache, clock) = cache();
        let target = Uuid::now_v7();

        cache.set(target, DerivedStatus::Friends);
        clock.advance(Duration::from_secs(29));

        assert_eq!(cache.get(&target), Some(DerivedStatus::Friends));
    }

    #[test]
    fn get_ignores_expired_entries() {
        let (mut cache, clock) = cache();
        let target = Uuid::now_v7();

        cache.set(target, DerivedStatus::Friends);
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.get(&target), None);
    }

    #[test]
    fn set_refreshes_the_timestamp() {
        let (mut cache, clock) = cache();
        let target = Uuid::now_v7();

        cache.set(target, DerivedStatus::Pending);
        clock.advance(Duration::from_secs(29));
        cache.set(target, DerivedStatus::Friends);
        clock.advance(Duration::from_secs(29));

        assert_eq!(cache.get(&target), Some(DerivedStatus::Friends));
    }

    #[test]
    fn clear_drops_everything() {
        let (mut cache, _clock) = cache();
        let target = Uuid::now_v7();

        cache.set(target, DerivedStatus::Incoming);
        cache.clear();

        assert_eq!(cache.get(&target), None);
    }

    #[test]
    fn unknown_key_misses() {
        let (cache, _clock) = cache();
        assert_eq!(cache.get(&Uuid::now_v7()), None);
    }
}
