use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use worklog_core::pipeline::{self, RunOutcome};

use crate::git::GitStore;

use super::RunContext;

pub async fn run(config_path: Option<&Path>, date: Option<NaiveDate>) -> Result<()> {
    let mut ctx = RunContext::load(config_path, date)?;

    println!("📅 Collecting {}", ctx.date);

    let fetch = ctx.fetch().await?;
    let mut store = GitStore::new(&ctx.config.publish);
    let path = store.relative_path(ctx.date);

    let outcome = pipeline::run(&ctx.classifier, &fetch.input, ctx.date, &ctx.secrets, &mut store)?;

    match outcome {
        RunOutcome::NothingToPublish => println!("Nothing to publish for {}.", ctx.date),
        RunOutcome::NoChange => println!("{} is already up to date.", path.display()),
        RunOutcome::Published => println!("Published {}", path.display()),
    }

    Ok(())
}
