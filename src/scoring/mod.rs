// Public API - what other modules can use
pub use handlers::fetch_scores;
pub use pagespeed::PageSpeedScoreFetcher;

// Internal modules
mod handlers;
mod pagespeed;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Response has no performance score")]
    MissingScore,
}

/// Looks up the performance score (0-100) of one site
#[async_trait]
pub trait ScoreFetcher: Send + Sync {
    async fn fetch_score(&self, site: &str) -> Result<f64, ScoreError>;
}

/// Score for one requested site
///
/// A failed lookup still yields a score of 0 so the race can run, but
/// `error` says why, letting clients tell a failure from a genuine 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteScore {
    pub url: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetches every site concurrently; results keep the input order
pub async fn fetch_all(fetcher: &dyn ScoreFetcher, sites: &[String]) -> Vec<SiteScore> {
    let lookups = sites.iter().map(|site| async move {
        match fetcher.fetch_score(site).await {
            Ok(score) => SiteScore {
                url: site.clone(),
                score,
                error: None,
            },
            Err(err) => {
                warn!(site = %site, error = %err, "Score lookup failed, scoring 0");
                SiteScore {
                    url: site.clone(),
                    score: 0.0,
                    error: Some(err.to_string()),
                }
            }
        }
    });

    join_all(lookups).await
}
