mod config;
mod db;
mod errors;
mod extraction;
mod matching;
mod models;
mod routes;
mod state;
mod store;

use anyhow::{bail, Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::pipeline::CvProcessor;
use crate::extraction::{SkillExtractor, SkillTaxonomy};
use crate::matching::{ScoringWeights, WeightedSkillMatcher, WorkloadCalculator};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{PgStore, S3DocumentStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Allocator API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let pg_store = Arc::new(PgStore::new(db));

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let documents = Arc::new(S3DocumentStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized");

    // Load the skill taxonomy (read-only from here on)
    let taxonomy = Arc::new(load_taxonomy(&config)?);
    info!(
        "Skill taxonomy loaded: {} skills, longest alias {} words",
        taxonomy.len(),
        taxonomy.max_alias_words()
    );

    let extractor =
        SkillExtractor::new(taxonomy.clone()).with_time_budget(config.extraction_timeout);
    let cv_processor = CvProcessor::new(extractor, pg_store.clone(), config.extraction_timeout);

    let workload = WorkloadCalculator::new(config.workload_capacity)?;
    info!(
        "Workload capacity: {} active tasks = 100%",
        workload.capacity()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        taxonomy,
        cv_processor,
        profiles: pg_store.clone(),
        directory: pg_store,
        documents,
        matcher: Arc::new(WeightedSkillMatcher::new(ScoringWeights::default())),
        workload,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict CORS origins to the frontend host
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Built-in taxonomy, or the JSON file at `SKILL_TAXONOMY_PATH`.
fn load_taxonomy(config: &Config) -> Result<SkillTaxonomy> {
    match &config.skill_taxonomy_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read skill taxonomy at {path}"))?;
            let taxonomy = SkillTaxonomy::from_json(&json)
                .with_context(|| format!("Invalid skill taxonomy at {path}"))?;
            if taxonomy.is_empty() {
                bail!("Skill taxonomy at {path} defines no skills");
            }
            Ok(taxonomy)
        }
        None => SkillTaxonomy::builtin().context("Built-in skill taxonomy is invalid"),
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "allocator-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
