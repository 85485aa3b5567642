// Public API - what other modules can use
pub use errors::RaceError;
pub use handlers::{get_admin_stats, get_leaderboard, get_public_stats, get_shared_race, submit_race};
pub use leaderboard::LeaderboardAggregator;
pub use models::{LeaderboardEntry, PublicRaceView, RaceRecord, RequesterMeta};
pub use normalize::normalize_site;
pub use recorder::{NewRace, RaceRecorder};
pub use repository::RaceRecordStore;
pub use share::ShareResolver;
pub use stats::RaceStatsService;

// Internal modules
mod errors;
pub mod generators;
mod handlers;
pub mod leaderboard;
pub mod models;
mod normalize;
pub mod recorder;
pub mod repository;
pub mod share;
pub mod stats;
pub mod types;
