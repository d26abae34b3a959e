use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use worklog_core::aggregate::Assembled;
use worklog_core::leak_guard;
use worklog_core::pipeline;

use super::{RunContext, print_skipped};

/// Render the day's document to stdout without committing anything.
pub async fn run(config_path: Option<&Path>, date: Option<NaiveDate>) -> Result<()> {
    let mut ctx = RunContext::load(config_path, date)?;
    let fetch = ctx.fetch().await?;

    let (assembled, skipped) = pipeline::build(&ctx.classifier, &fetch.input, ctx.date);
    print_skipped(&skipped);

    match assembled {
        Assembled::Document(document) => {
            // Same guard as sync, so a preview never prints a secret either
            let vetted = leak_guard::vet(document, &ctx.secrets)?;
            print!("{}", vetted.document().text());
        }
        Assembled::NothingToPublish => println!("Nothing to publish for {}.", ctx.date),
    }

    Ok(())
}
