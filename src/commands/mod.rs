pub mod check;
pub mod init;
pub mod preview;
pub mod sync;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate, Utc};
use worklog_core::classify::Classifier;
use worklog_core::leak_guard::SecretSet;
use worklog_core::pipeline::SkippedRecord;

use crate::config::{self, Config};
use crate::graph::{self, DayFetch, GraphClient};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a run needs before touching the network.
pub struct RunContext {
    pub config: Config,
    pub offset: FixedOffset,
    pub date: NaiveDate,
    pub classifier: Classifier,
    pub secrets: SecretSet,
}

impl RunContext {
    pub fn load(config_path: Option<&Path>, date: Option<NaiveDate>) -> Result<Self> {
        let config = config::load(config_path)?;
        config.validate()?;

        let offset = config.schedule.offset()?;
        let date = date.unwrap_or_else(|| today(offset));
        let classifier = Classifier::new(&config.redaction, &config.render, offset)?;
        let secrets = config.secrets();

        Ok(RunContext {
            config,
            offset,
            date,
            classifier,
            secrets,
        })
    }

    /// Exchange the refresh token and fetch the day's records.
    ///
    /// Token failure is fatal; a failing source only empties its share of
    /// the input.
    pub async fn fetch(&mut self) -> Result<DayFetch> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let access_token = graph::acquire_token(&http, &self.config.graph).await?;
        self.secrets.insert("access token", access_token.as_str());

        let client = GraphClient::new(http, &self.config.graph, access_token)?;
        let fetch = client.fetch_day(self.date, self.offset).await;

        for failure in &fetch.failures {
            eprintln!("⚠ Could not fetch {}: {}", failure.source, failure.error);
        }

        Ok(fetch)
    }
}

/// Current date in the target zone.
pub fn today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

pub fn print_skipped(skipped: &[SkippedRecord]) {
    if skipped.is_empty() {
        return;
    }

    eprintln!("Skipped {} record(s):", skipped.len());
    for record in skipped {
        eprintln!("  {:?} #{}: {}", record.category, record.index, record.reason);
    }
}
