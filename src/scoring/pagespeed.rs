use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ScoreError, ScoreFetcher};
use crate::config::AppConfig;

/// Lighthouse runs are slow; allow for a full mobile audit
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Default, Deserialize)]
struct LighthouseResult {
    categories: Option<Categories>,
}

#[derive(Debug, Default, Deserialize)]
struct Categories {
    performance: Option<Category>,
}

#[derive(Debug, Default, Deserialize)]
struct Category {
    score: Option<f64>,
}

impl PageSpeedResponse {
    /// Lighthouse reports 0.0-1.0; the game works in 0-100
    fn performance_score(&self) -> Option<f64> {
        let raw = self
            .lighthouse_result
            .as_ref()?
            .categories
            .as_ref()?
            .performance
            .as_ref()?
            .score?;
        raw.is_finite().then(|| (raw * 100.0).clamp(0.0, 100.0))
    }
}

/// Scores sites with the Google PageSpeed Insights API
pub struct PageSpeedScoreFetcher {
    client: reqwest::Client,
    endpoint: String,
    strategy: String,
    api_key: Option<String>,
}

impl PageSpeedScoreFetcher {
    pub fn new(
        endpoint: impl Into<String>,
        strategy: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, ScoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            strategy: strategy.into(),
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ScoreError> {
        Self::new(
            config.pagespeed_endpoint.clone(),
            config.pagespeed_strategy.clone(),
            config.pagespeed_api_key.clone(),
        )
    }
}

#[async_trait]
impl ScoreFetcher for PageSpeedScoreFetcher {
    #[instrument(skip(self))]
    async fn fetch_score(&self, site: &str) -> Result<f64, ScoreError> {
        let mut query = vec![("url", site), ("strategy", self.strategy.as_str())];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        let body = response.json::<PageSpeedResponse>().await?;

        let score = body.performance_score().ok_or(ScoreError::MissingScore)?;
        debug!(score, "PageSpeed score received");
        Ok(score)
    }
}
