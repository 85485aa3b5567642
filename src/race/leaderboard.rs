use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use super::{
    models::{LeaderboardEntry, RaceRecord},
    normalize::normalize_site,
    repository::RaceRecordStore,
    RaceError,
};

/// Folds stored race history into a ranked per-site summary
///
/// Holds no state between calls; every call rescans the most recent
/// `scan_limit` races.
pub struct LeaderboardAggregator {
    records: RaceRecordStore,
    scan_limit: usize,
}

impl LeaderboardAggregator {
    pub fn new(records: RaceRecordStore, scan_limit: usize) -> Self {
        Self {
            records,
            scan_limit,
        }
    }

    #[instrument(skip(self), fields(scan_limit = self.scan_limit))]
    pub async fn compute(&self) -> Result<Vec<LeaderboardEntry>, RaceError> {
        let race_ids = self.records.recent_race_ids(self.scan_limit).await?;
        let wins = self.records.win_counts().await?;
        debug!(races = race_ids.len(), sites_with_wins = wins.len(), "Loaded race history");

        let mut board = LeaderboardBuilder::new(&wins);
        for race_id in &race_ids {
            if let Some(record) = self.records.load_record(race_id).await? {
                board.add_race(&record);
            }
        }

        let entries = board.finish();
        info!(sites = entries.len(), "Leaderboard computed");
        Ok(entries)
    }
}

/// Accumulates entries in order of first appearance
struct LeaderboardBuilder<'a> {
    wins: &'a HashMap<String, u64>,
    entries: Vec<LeaderboardEntry>,
    positions: HashMap<String, usize>,
}

impl<'a> LeaderboardBuilder<'a> {
    fn new(wins: &'a HashMap<String, u64>) -> Self {
        Self {
            wins,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn add_race(&mut self, record: &RaceRecord) {
        for (index, participant) in record.participants.iter().enumerate() {
            let site = normalize_site(participant);
            let score = record.score_at(index);
            let wins = self.wins.get(site).copied().unwrap_or(0);

            match self.positions.get(site) {
                Some(&position) => {
                    let entry = &mut self.entries[position];
                    entry.best_score = entry.best_score.max(score);
                    entry.total_races += 1;
                    entry.wins = wins;
                    entry.last_raced = entry.last_raced.max(record.timestamp);
                }
                None => {
                    self.positions.insert(site.to_string(), self.entries.len());
                    self.entries.push(LeaderboardEntry {
                        site: site.to_string(),
                        best_score: score,
                        total_races: 1,
                        wins,
                        last_raced: record.timestamp,
                    });
                }
            }
        }
    }

    /// Highest best score first; equal scores fall back to site name ascending
    fn finish(mut self) -> Vec<LeaderboardEntry> {
        self.entries.sort_by(rank_entries);
        self.entries
    }
}

fn rank_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.best_score
        .total_cmp(&a.best_score)
        .then_with(|| a.site.cmp(&b.site))
}
