// Library crate for the site race server
// This file exposes the public API for integration tests

pub mod config;
pub mod race;
pub mod routes;
pub mod scoring;
pub mod shared;
pub mod store;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use race::{
    normalize_site, LeaderboardAggregator, LeaderboardEntry, NewRace, PublicRaceView,
    RaceError, RaceRecord, RaceRecordStore, RaceRecorder, RaceStatsService, ShareResolver,
};
pub use routes::build_router;
pub use scoring::{ScoreError, ScoreFetcher, SiteScore};
pub use shared::{AppError, AppState};
pub use store::{InMemoryStore, KeyValueStore, RedisStore, StoreError};
