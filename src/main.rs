use mindful_cart::{
    analysis::OpenAiAnalyzer,
    config::{database, settings},
    errors::Result,
    sweeper::PriceSweeper,
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application settings
    let app_config = settings::load_config_or_default(settings::DEFAULT_CONFIG_PATH)
        .inspect_err(|e| error!("Failed to load application configuration: {}", e))?;
    info!(
        sweep_interval_secs = app_config.scheduler.sweep_interval_secs,
        "Loaded application configuration."
    );

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Build the price analyzer; without a key prices are left as they are
    let api_key = env::var("OPENAI_API_KEY").ok();
    if api_key.is_none() {
        warn!("OPENAI_API_KEY not set, price tracking will keep current prices.");
    }
    let analyzer = OpenAiAnalyzer::new(app_config.analysis.clone(), api_key)?;

    // 6. Start the periodic sweeper
    let sweeper = PriceSweeper::new(
        Arc::new(db),
        Arc::new(analyzer),
        app_config.scheduler.sweep_interval(),
    );
    let handle = sweeper.start();

    // 7. Run until interrupted, then stop the sweeper
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping price sweeper.");
    handle.stop().await?;

    Ok(())
}
