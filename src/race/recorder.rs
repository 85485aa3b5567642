use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{
    generators::{RandomShareTokenGenerator, ShareTokenGenerator},
    models::{RaceRecord, RequesterMeta},
    normalize::normalize_site,
    repository::RaceRecordStore,
    RaceError,
};

pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_PARTICIPANTS: usize = 3;
pub const MAX_SCORE: f64 = 100.0;

/// Attempts at finding an unused share token before giving up
const DEFAULT_TOKEN_ATTEMPTS: usize = 5;

/// A finished race as submitted by the client
#[derive(Debug, Clone)]
pub struct NewRace {
    pub participants: Vec<String>,
    pub scores: Vec<f64>,
    pub winner_index: usize,
    pub requester: Option<RequesterMeta>,
}

/// Persists finished races and keeps the derived counters in step
///
/// Writes are issued one after another with no cross-key transaction:
/// the share token is reserved first, then the record hash, the id list,
/// the race counter, usage and finally wins. A failure part way leaves the
/// earlier writes in place and is reported as a storage failure.
pub struct RaceRecorder {
    records: RaceRecordStore,
    token_generator: Arc<dyn ShareTokenGenerator>,
    token_attempts: usize,
}

impl RaceRecorder {
    pub fn new(records: RaceRecordStore) -> Self {
        Self::with_token_generator(records, Arc::new(RandomShareTokenGenerator::new()))
    }

    pub fn with_token_generator(
        records: RaceRecordStore,
        token_generator: Arc<dyn ShareTokenGenerator>,
    ) -> Self {
        Self {
            records,
            token_generator,
            token_attempts: DEFAULT_TOKEN_ATTEMPTS,
        }
    }

    #[instrument(skip(self, race), fields(participants = race.participants.len()))]
    pub async fn record(&self, race: NewRace) -> Result<RaceRecord, RaceError> {
        validate_new_race(&race)?;

        let mut record = RaceRecord::new(
            String::new(),
            race.participants,
            race.scores,
            race.winner_index,
            race.requester,
        );
        record.share_token = self.claim_share_token(&record.id).await?;
        debug!(race_id = %record.id, share_token = %record.share_token, "Claimed share token");

        if let Err(err) = self.persist(&record).await {
            error!(
                race_id = %record.id,
                error = %err,
                "Race recording failed part way, earlier writes are kept"
            );
            return Err(err);
        }

        info!(
            race_id = %record.id,
            share_token = %record.share_token,
            winner = record.winner().unwrap_or_default(),
            "Race recorded"
        );
        Ok(record)
    }

    async fn claim_share_token(&self, race_id: &str) -> Result<String, RaceError> {
        for attempt in 1..=self.token_attempts {
            let token = self.token_generator.generate();
            if self.records.reserve_share_token(&token, race_id).await? {
                return Ok(token);
            }
            warn!(attempt, token = %token, "Share token already taken, retrying");
        }

        Err(RaceError::ShareTokenExhausted {
            attempts: self.token_attempts,
        })
    }

    async fn persist(&self, record: &RaceRecord) -> Result<(), RaceError> {
        self.records.save_record(record).await?;
        self.records.append_race_id(&record.id).await?;
        self.records.increment_race_count().await?;

        for participant in &record.participants {
            self.records
                .increment_site_usage(normalize_site(participant))
                .await?;
        }

        if let Some(winner) = record.winner() {
            self.records
                .increment_site_wins(normalize_site(winner))
                .await?;
        }

        Ok(())
    }
}

/// Rejects malformed races before anything touches the store
pub fn validate_new_race(race: &NewRace) -> Result<(), RaceError> {
    let count = race.participants.len();
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&count) {
        return Err(RaceError::Validation(format!(
            "a race needs {MIN_PARTICIPANTS} to {MAX_PARTICIPANTS} sites, got {count}"
        )));
    }

    if race.scores.len() != count {
        return Err(RaceError::Validation(format!(
            "got {} scores for {count} sites",
            race.scores.len()
        )));
    }

    if race.participants.iter().any(|site| site.trim().is_empty()) {
        return Err(RaceError::Validation("site URLs must not be empty".to_string()));
    }

    if let Some(score) = race
        .scores
        .iter()
        .find(|score| !score.is_finite() || **score < 0.0 || **score > MAX_SCORE)
    {
        return Err(RaceError::Validation(format!(
            "score {score} is outside 0..={MAX_SCORE}"
        )));
    }

    if race.winner_index >= count {
        return Err(RaceError::Validation(format!(
            "winner index {} is out of range for {count} sites",
            race.winner_index
        )));
    }

    let best = race.scores.iter().copied().fold(f64::MIN, f64::max);
    if race.scores[race.winner_index] < best {
        return Err(RaceError::Validation(format!(
            "winner score {} is below the best score {best}",
            race.scores[race.winner_index]
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::models::keys;
    use crate::store::{InMemoryStore, KeyValueStore};
    use rstest::rstest;
    use std::sync::Mutex;

    /// Hands out a fixed sequence of tokens, repeating the last one
    struct ScriptedTokens {
        tokens: Mutex<Vec<String>>,
    }

    impl ScriptedTokens {
        fn new(tokens: &[&str]) -> Self {
            Self {
                tokens: Mutex::new(tokens.iter().rev().map(|t| t.to_string()).collect()),
            }
        }
    }

    impl ShareTokenGenerator for ScriptedTokens {
        fn generate(&self) -> String {
            let mut tokens = self.tokens.lock().unwrap();
            if tokens.len() > 1 {
                tokens.pop().unwrap()
            } else {
                tokens[0].clone()
            }
        }
    }

    fn race(participants: &[&str], scores: &[f64], winner_index: usize) -> NewRace {
        NewRace {
            participants: participants.iter().map(|p| p.to_string()).collect(),
            scores: scores.to_vec(),
            winner_index,
            requester: None,
        }
    }

    fn recorder_with(store: Arc<InMemoryStore>) -> RaceRecorder {
        RaceRecorder::new(RaceRecordStore::new(store))
    }

    #[tokio::test]
    async fn record_updates_every_counter() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = recorder_with(store.clone());

        let record = recorder
            .record(race(&["https://a.com", "https://b.com/page"], &[40.0, 90.0], 1))
            .await
            .unwrap();

        assert_eq!(record.winner_index, 1);
        assert_eq!(record.share_token.len(), 6);

        assert_eq!(store.get(keys::RACE_COUNT).await.unwrap().as_deref(), Some("1"));
        assert_eq!(
            store.lrange(keys::RACE_IDS, 0, -1).await.unwrap(),
            vec![record.id.clone()]
        );
        assert_eq!(
            store.get(&keys::share(&record.share_token)).await.unwrap(),
            Some(record.id.clone())
        );

        let usage = store
            .zrange_with_scores(keys::SITE_USAGE, 0, -1, false)
            .await
            .unwrap();
        assert_eq!(
            usage,
            vec![("a.com".to_string(), 1.0), ("b.com".to_string(), 1.0)]
        );

        let wins = store
            .zrange_with_scores(keys::SITE_WINS, 0, -1, false)
            .await
            .unwrap();
        assert_eq!(wins, vec![("b.com".to_string(), 1.0)]);
    }

    #[tokio::test]
    async fn only_the_winner_gains_a_win() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = recorder_with(store.clone());
        let records = RaceRecordStore::new(store.clone());

        recorder
            .record(race(&["x.com", "y.com"], &[50.0, 60.0], 1))
            .await
            .unwrap();
        let before = records.win_counts().await.unwrap();

        recorder
            .record(race(&["x.com", "y.com", "z.com"], &[80.0, 20.0, 10.0], 0))
            .await
            .unwrap();
        let after = records.win_counts().await.unwrap();

        assert_eq!(after.get("x.com"), Some(&1));
        assert_eq!(after.get("y.com"), before.get("y.com"));
        assert_eq!(after.get("z.com"), None);
    }

    #[tokio::test]
    async fn retries_when_share_token_is_taken() {
        let store = Arc::new(InMemoryStore::new());
        let records = RaceRecordStore::new(store.clone());
        records.reserve_share_token("taken1", "older-race").await.unwrap();

        let recorder = RaceRecorder::with_token_generator(
            records,
            Arc::new(ScriptedTokens::new(&["taken1", "fresh1"])),
        );
        let record = recorder
            .record(race(&["a.com", "b.com"], &[10.0, 20.0], 1))
            .await
            .unwrap();

        assert_eq!(record.share_token, "fresh1");
    }

    #[tokio::test]
    async fn gives_up_when_every_token_is_taken() {
        let store = Arc::new(InMemoryStore::new());
        let records = RaceRecordStore::new(store.clone());
        records.reserve_share_token("taken1", "older-race").await.unwrap();

        let recorder = RaceRecorder::with_token_generator(
            records,
            Arc::new(ScriptedTokens::new(&["taken1"])),
        );
        let result = recorder
            .record(race(&["a.com", "b.com"], &[10.0, 20.0], 1))
            .await;

        assert!(matches!(
            result,
            Err(RaceError::ShareTokenExhausted { attempts: 5 })
        ));
        assert!(store.lrange(keys::RACE_IDS, 0, -1).await.unwrap().is_empty());
    }

    #[rstest]
    #[case::one_site(race(&["a.com"], &[10.0], 0))]
    #[case::four_sites(race(&["a", "b", "c", "d"], &[1.0, 2.0, 3.0, 4.0], 3))]
    #[case::score_count_mismatch(race(&["a.com", "b.com"], &[10.0], 0))]
    #[case::winner_out_of_range(race(&["a.com", "b.com"], &[10.0, 20.0], 2))]
    #[case::winner_not_best(race(&["a.com", "b.com"], &[10.0, 20.0], 0))]
    #[case::score_above_range(race(&["a.com", "b.com"], &[10.0, 120.0], 1))]
    #[case::negative_score(race(&["a.com", "b.com"], &[-1.0, 20.0], 1))]
    #[case::nan_score(race(&["a.com", "b.com"], &[f64::NAN, 20.0], 1))]
    #[case::blank_site(race(&["a.com", "  "], &[10.0, 20.0], 1))]
    #[tokio::test]
    async fn rejects_invalid_races_without_touching_the_store(#[case] invalid: NewRace) {
        let store = Arc::new(InMemoryStore::new());
        let recorder = recorder_with(store.clone());

        let result = recorder.record(invalid).await;

        assert!(matches!(result, Err(RaceError::Validation(_))));
        assert_eq!(store.operation_count(), 0);
    }

    #[test]
    fn accepts_tied_winner() {
        assert!(validate_new_race(&race(&["a.com", "b.com"], &[70.0, 70.0], 0)).is_ok());
        assert!(validate_new_race(&race(&["a.com", "b.com"], &[70.0, 70.0], 1)).is_ok());
    }
}
