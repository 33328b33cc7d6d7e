use asi_engine::api::router::create_router;
use asi_engine::config::AppConfig;
use asi_engine::services::evaluation::run_divergence_scheduler;
use asi_engine::services::narrative::NarrativeClient;
use asi_engine::services::price_feed::HttpPriceSource;
use asi_engine::services::reconciliation::run_reconciliation_poller;
use asi_engine::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = metrics::init_metrics();

    // --- Divergence evaluation scheduler ---
    let narrative = match &config.narrative_url {
        Some(url) => Some(NarrativeClient::new(
            url.clone(),
            config.narrative_timeout_secs,
        )?),
        None => {
            tracing::info!("NARRATIVE_URL not set, divergence logs will carry no insight text");
            None
        }
    };
    {
        let db = db.clone();
        let config = config.clone();
        tokio::spawn(async move {
            run_divergence_scheduler(db, config, narrative).await;
        });
    }
    tracing::info!(
        interval_secs = config.divergence_interval_secs,
        concurrency = config.eval_concurrency,
        "Divergence scheduler spawned"
    );

    // --- Outcome reconciliation ---
    match &config.price_feed_url {
        Some(url) => {
            let price_source = HttpPriceSource::new(url.clone(), config.price_feed_timeout_secs)?;
            let db = db.clone();
            let config = config.clone();
            tokio::spawn(async move {
                run_reconciliation_poller(db, price_source, config).await;
            });
            tracing::info!("Reconciliation poller spawned");
        }
        None => {
            tracing::warn!(
                "PRICE_FEED_URL not set, whale and signal outcomes will stay unresolved"
            );
        }
    }

    let state = AppState {
        db,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
