use std::env;
use std::sync::Arc;

use orchestrator::{DraftService, GenerateOptions};
use outreach_core::Settings;
use outreach_database::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE_URL: &str = "sqlite:data/outreach.db?mode=rwc";

fn usage() -> ! {
    eprintln!("Usage: draft-campaign <campaign_id> [limit] [owner_key]");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = env::args().skip(1);
    let campaign_id: i64 = match args.next().map(|arg| arg.parse()) {
        Some(Ok(id)) => id,
        _ => usage(),
    };

    let mut options = GenerateOptions::default();
    if let Some(limit) = args.next() {
        options.limit = match limit.parse() {
            Ok(limit) => limit,
            Err(_) => usage(),
        };
    }
    options.owner_key = args.next();

    let settings = Settings::from_env()?;
    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let tools = agent_tools::default_registry(&settings, Arc::new(db.clone()))?;
    info!("Tools available: {:?}", tools.available().await);

    let service = DraftService::new(db.clone(), Arc::new(tools), settings);
    let report = service.generate(campaign_id, options).await?;

    info!(
        "Campaign {}: created={} ignored={} failed={} skipped={}",
        campaign_id, report.created, report.ignored, report.failed, report.skipped
    );
    println!("{}", serde_json::to_string(&report)?);

    db.close().await;
    Ok(())
}
