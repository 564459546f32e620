//! list_models - print the models offered by the custom inference endpoint

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use detection_viewer::models::{self, ModelInfo};
use detection_viewer::DetectConfig;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the endpoint; the listing path is joined onto its origin.
    /// Defaults to the configured models URL or API endpoint.
    #[arg(long)]
    url: Option<String>,
    /// Request timeout in seconds when --url is given.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (url, timeout) = match &args.url {
        Some(base) => (models::listing_url(base)?, Duration::from_secs(args.timeout_secs)),
        None => {
            let config = DetectConfig::load()?;
            let url = config.models_listing_url().ok_or_else(|| {
                anyhow!("no models URL configured; set DETECT_MODELS_URL or pass --url")
            })??;
            (url, config.timeout)
        }
    };

    log::info!("fetching models from {}", url);
    let listing = models::fetch_models(&url, timeout)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else if listing.is_empty() {
        println!("no models available");
    } else {
        for model in &listing {
            print_model(model);
        }
    }
    Ok(())
}

fn print_model(model: &ModelInfo) {
    println!(
        "{:>3}  {}  (version {}, task {})",
        model.model_id, model.model_name, model.version, model.task
    );
    if !model.description.is_empty() {
        println!("     {}", model.description);
    }
}
