use std::collections::HashMap;
use std::time::{Duration, Instant};

/// What a re-acquisition request was scoped to, below the catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubKey {
    Episode { season: u32, episode: u32 },
    Season(u32),
    Album(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub entity: i64,
    pub sub: Option<SubKey>,
}

impl CooldownKey {
    pub fn entity(entity: i64) -> Self {
        Self { entity, sub: None }
    }

    pub fn episode(series: i64, season: u32, episode: u32) -> Self {
        Self {
            entity: series,
            sub: Some(SubKey::Episode { season, episode }),
        }
    }

    pub fn season(series: i64, season: u32) -> Self {
        Self {
            entity: series,
            sub: Some(SubKey::Season(season)),
        }
    }

    pub fn album(artist: i64, album: i64) -> Self {
        Self {
            entity: artist,
            sub: Some(SubKey::Album(album)),
        }
    }
}

/// Last re-acquisition trigger per key. Process lifetime only.
#[derive(Debug)]
pub struct CooldownTracker {
    cooldown: Duration,
    last_triggered: HashMap<CooldownKey, Instant>,
}

impl CooldownTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_triggered: HashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn should_trigger(&self, key: &CooldownKey) -> bool {
        self.should_trigger_at(key, Instant::now())
    }

    pub fn should_trigger_at(&self, key: &CooldownKey, now: Instant) -> bool {
        match self.last_triggered.get(key) {
            Some(last) => now.saturating_duration_since(*last) > self.cooldown,
            None => true,
        }
    }

    pub fn record(&mut self, key: CooldownKey) {
        self.record_at(key, Instant::now());
    }

    pub fn record_at(&mut self, key: CooldownKey, now: Instant) {
        self.last_triggered.insert(key, now);
    }

    pub fn len(&self) -> usize {
        self.last_triggered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_triggered.is_empty()
    }
}
