//! Command handlers, called from `main` once configuration and the pool are
//! established.

use std::future::Future;
use std::sync::Arc;

use prospector_core::{AppConfig, AudienceRegistry};
use prospector_db::{PgQueue, PgStore};
use prospector_pipeline::{enqueue_job, Collaborators, RunRequest, WebsiteProspector, Worker};

use crate::summary;

/// Fill unspecified options from the configured defaults.
pub(crate) fn run_request(
    config: &AppConfig,
    audience: Option<String>,
    location: Option<String>,
    max: Option<usize>,
) -> RunRequest {
    RunRequest::new(
        audience.as_deref().unwrap_or(&config.default_audience),
        location.as_deref().unwrap_or(&config.default_location),
        max.unwrap_or(config.default_max_prospects),
    )
}

fn build_prospector(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    offline: bool,
) -> anyhow::Result<WebsiteProspector> {
    let registry = AudienceRegistry::builtin()?;
    let collaborators = if offline {
        tracing::info!("offline mode: using stub collaborators");
        Collaborators::offline()
    } else {
        Collaborators::live(config)?
    };
    let store = Arc::new(PgStore::new(pool.clone()));
    Ok(WebsiteProspector::new(registry, collaborators, store)
        .with_max_concurrent_urls(config.max_concurrent_urls))
}

/// Run the website prospector once and print its summary.
///
/// # Errors
///
/// Returns an error if migrations fail, the collaborators cannot be built or
/// the run fails. A failed run has already been marked `failed`.
pub(crate) async fn run_workflow(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    request: &RunRequest,
    offline: bool,
) -> anyhow::Result<()> {
    prospector_db::run_migrations(pool).await?;
    let prospector = build_prospector(config, pool, offline)?;
    let report = prospector.run(request).await?;
    println!("{}", summary::render_summary(&report));
    Ok(())
}

pub(crate) async fn run_worker<F>(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    offline: bool,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    prospector_db::run_migrations(pool).await?;
    prospector_db::create_queue(pool, &config.queue_name).await?;
    let prospector = build_prospector(config, pool, offline)?;
    let queue = Arc::new(PgQueue::new(pool.clone(), config.queue_name.clone()));
    let worker = Worker::new(prospector, queue).with_config(config);

    tracing::info!(queue = %config.queue_name, offline, "worker started");
    worker.run_until(shutdown).await;
    Ok(())
}

pub(crate) async fn enqueue(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    request: &RunRequest,
) -> anyhow::Result<()> {
    prospector_db::create_queue(pool, &config.queue_name).await?;
    let registry = AudienceRegistry::builtin()?;
    let store = PgStore::new(pool.clone());
    let queue = PgQueue::new(pool.clone(), config.queue_name.clone());

    let job = enqueue_job(
        &registry,
        &store,
        &queue,
        &request.audience_name,
        &request.location,
        request.max_prospects,
    )
    .await?;
    println!(
        "queued run {} for {} in {} (message {})",
        job.run_id, request.audience_name, request.location, job.msg_id
    );
    Ok(())
}

pub(crate) fn list_audiences() -> anyhow::Result<()> {
    let registry = AudienceRegistry::builtin()?;
    for audience in registry.iter() {
        let (min, max) = audience.budget_range;
        println!("{} ({})", audience.name, audience.audience_type);
        if !audience.description.is_empty() {
            println!("  {}", audience.description);
        }
        println!(
            "  budget ${min}-${max} | up to {} prospects per run | tone: {}",
            audience.max_prospects_per_run, audience.pitch_tone
        );
        println!(
            "  {} search patterns x {} keywords",
            audience.search_patterns.len(),
            audience.keywords.len()
        );
    }
    Ok(())
}

pub(crate) async fn list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = prospector_db::list_workflow_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no workflow runs recorded");
        return Ok(());
    }

    println!("| Run | Audience | Location | Status | Created | Error |");
    println!("|-----|----------|----------|--------|---------|-------|");
    for run in &runs {
        println!(
            "| {} | {} | {} | {} | {} | {} |",
            run.public_id,
            run.audience_name,
            run.location,
            run.status,
            run.created_at.format("%Y-%m-%d %H:%M"),
            run.error_message.as_deref().unwrap_or("-").replace('|', "\\|")
        );
    }
    Ok(())
}
