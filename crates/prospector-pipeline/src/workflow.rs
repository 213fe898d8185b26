//! The website-prospector workflow: search, score, contacts, persist.

use std::sync::Arc;

use anyhow::Context;
use futures::future;
use futures::stream::{self, StreamExt};
use prospector_core::{AppConfig, AudienceConfig, AudienceRegistry, ContactInfo, Prospect};
use prospector_scoring::{ScoringWeights, SiteAnalysis};
use prospector_scraper::{BrowserlessClient, ClientSettings, OpenAiSearchClient, ScraperError};
use uuid::Uuid;

use crate::error::{PipelineError, Step};
use crate::providers::{
    ContactProvider, SearchProvider, StubContacts, StubSearch, StubTelemetry, TelemetrySource,
};
use crate::steps::{timed_step, StepTiming};
use crate::store::{ProspectContacts, ProspectStore, RunHandle};

pub const WORKFLOW_NAME: &str = "website_prospector";

/// The three network collaborators, chosen once at construction.
#[derive(Clone)]
pub struct Collaborators {
    pub telemetry: Arc<dyn TelemetrySource>,
    pub search: Arc<dyn SearchProvider>,
    pub contacts: Arc<dyn ContactProvider>,
}

impl Collaborators {
    /// Deterministic stand-ins that never touch the network.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            telemetry: Arc::new(StubTelemetry),
            search: Arc::new(StubSearch),
            contacts: Arc::new(StubContacts),
        }
    }

    /// Browserless for rendering and contacts, OpenAI web search for discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidConfig`] when `OPENAI_API_KEY` is unset or
    /// the Browserless URL is blank, and [`ScraperError::Http`] if an HTTP
    /// client cannot be built.
    pub fn live(config: &AppConfig) -> Result<Self, ScraperError> {
        let settings = ClientSettings::from_app_config(config);
        let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
            ScraperError::InvalidConfig(
                "OPENAI_API_KEY must be set for live search (or run with --offline)".to_owned(),
            )
        })?;
        let search = OpenAiSearchClient::new(api_key, &config.search_model, &settings)?;
        let browserless = Arc::new(BrowserlessClient::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
            &settings,
        )?);

        Ok(Self {
            telemetry: browserless.clone(),
            search: Arc::new(search),
            contacts: browserless,
        })
    }
}

/// Which run row a request executes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTarget {
    /// Create a new run.
    New,
    /// Start a run that was created `pending` by the enqueuer.
    Existing(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub audience_name: String,
    pub location: String,
    /// Requested cap; the audience's own cap still applies.
    pub max_prospects: usize,
    pub target: RunTarget,
}

impl RunRequest {
    #[must_use]
    pub fn new(audience_name: &str, location: &str, max_prospects: usize) -> Self {
        Self {
            audience_name: audience_name.to_owned(),
            location: location.to_owned(),
            max_prospects,
            target: RunTarget::New,
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub audience: String,
    pub location: String,
    pub prospects: Vec<Prospect>,
    pub analyses: Vec<SiteAnalysis>,
    pub contacts: Vec<ProspectContacts>,
    pub timings: Vec<StepTiming>,
}

pub struct WebsiteProspector {
    registry: AudienceRegistry,
    collaborators: Collaborators,
    store: Arc<dyn ProspectStore>,
    weights: ScoringWeights,
    max_concurrent_urls: usize,
}

impl WebsiteProspector {
    #[must_use]
    pub fn new(
        registry: AudienceRegistry,
        collaborators: Collaborators,
        store: Arc<dyn ProspectStore>,
    ) -> Self {
        Self {
            registry,
            collaborators,
            store,
            weights: ScoringWeights::default(),
            max_concurrent_urls: 1,
        }
    }

    /// URLs rendered at once in the score and contacts steps. Zero means one.
    #[must_use]
    pub fn with_max_concurrent_urls(mut self, max_concurrent_urls: usize) -> Self {
        self.max_concurrent_urls = max_concurrent_urls.max(1);
        self
    }

    #[must_use]
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &AudienceRegistry {
        &self.registry
    }

    /// Execute one run end to end.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::UnknownAudience`] before any step runs. No row is
    ///   written for a new run; an existing `pending` run is marked `failed`.
    /// - [`PipelineError::Run`] if the run row cannot be created or started.
    /// - [`PipelineError::StepFailure`] for a failed step; the run is marked
    ///   `failed` first.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        let Ok(audience) = self.registry.get(&request.audience_name) else {
            let err = PipelineError::UnknownAudience(request.audience_name.clone());
            if let RunTarget::Existing(public_id) = request.target {
                self.abandon_run(public_id, &err.detailed_message()).await;
            }
            return Err(err);
        };

        let run = self.open_run(request).await.map_err(PipelineError::Run)?;
        tracing::info!(
            run_id = %run.public_id,
            audience = %audience.name,
            location = %request.location,
            max_prospects = request.max_prospects,
            "workflow run started"
        );

        match self.execute(&run, audience, request).await {
            Ok(report) => {
                tracing::info!(
                    run_id = %run.public_id,
                    prospects = report.prospects.len(),
                    analyses = report.analyses.len(),
                    "workflow run completed"
                );
                Ok(report)
            }
            Err(err) => {
                self.fail_run_best_effort(&run, &err.detailed_message()).await;
                Err(err)
            }
        }
    }

    async fn open_run(&self, request: &RunRequest) -> anyhow::Result<RunHandle> {
        match request.target {
            RunTarget::Existing(public_id) => self.store.start_run(public_id).await,
            RunTarget::New => {
                let created = self
                    .store
                    .create_run(
                        &request.audience_name,
                        &request.location,
                        Some(request.max_prospects),
                    )
                    .await?;
                match self.store.start_run(created.public_id).await {
                    Ok(run) => Ok(run),
                    Err(err) => {
                        self.fail_run_best_effort(&created, &format!("{err:#}")).await;
                        Err(err)
                    }
                }
            }
        }
    }

    async fn execute(
        &self,
        run: &RunHandle,
        audience: &AudienceConfig,
        request: &RunRequest,
    ) -> Result<RunReport, PipelineError> {
        let mut timings = Vec::with_capacity(4);
        let limit = request.max_prospects.min(audience.max_prospects_per_run);

        let urls = timed_step(run.public_id, Step::Search, &mut timings, async {
            let queries = audience.search_queries(&request.location);
            let found = self.collaborators.search.discover(&queries, limit).await?;
            Ok::<_, anyhow::Error>(dedupe_urls(found, limit))
        })
        .await?;

        let prospects: Vec<Prospect> = urls
            .iter()
            .map(|url| {
                Prospect::discovered(
                    url,
                    Some(audience.name.as_str()),
                    Some(request.location.as_str()),
                )
            })
            .collect();

        let analyses = timed_step(run.public_id, Step::Score, &mut timings, async {
            Ok(self.score_urls(&urls).await)
        })
        .await?;

        let contacts = timed_step(run.public_id, Step::Contacts, &mut timings, async {
            Ok(self.collect_contacts(&urls).await)
        })
        .await?;

        timed_step(run.public_id, Step::Persist, &mut timings, async {
            self.store
                .insert_prospects(run, &prospects)
                .await
                .context("insert prospects")?;
            self.store
                .insert_analyses(run, &analyses)
                .await
                .context("insert site analyses")?;
            self.store
                .insert_contacts(run, &contacts)
                .await
                .context("insert contacts")?;
            self.store
                .complete_run(run)
                .await
                .context("mark run completed")
        })
        .await?;

        Ok(RunReport {
            run_id: run.public_id,
            audience: audience.name.clone(),
            location: request.location.clone(),
            prospects,
            analyses,
            contacts,
            timings,
        })
    }

    /// Analyses in URL order. A URL that fails to render has none.
    async fn score_urls(&self, urls: &[String]) -> Vec<SiteAnalysis> {
        stream::iter(urls)
            .map(|url| async move {
                match self.collaborators.telemetry.render(url).await {
                    Ok(bundle) => Some(prospector_scoring::score(&bundle, &self.weights)),
                    Err(err) => {
                        tracing::warn!(url = %url, error = %err, "render failed, skipping analysis");
                        None
                    }
                }
            })
            .buffered(self.max_concurrent_urls)
            .filter_map(future::ready)
            .collect()
            .await
    }

    /// One entry per URL, in URL order. Extraction errors give empty info.
    async fn collect_contacts(&self, urls: &[String]) -> Vec<ProspectContacts> {
        stream::iter(urls)
            .map(|url| async move {
                let info = match self.collaborators.contacts.extract(url).await {
                    Ok(info) => info.capped(),
                    Err(err) => {
                        tracing::warn!(url = %url, error = %format!("{err:#}"), "contact extraction failed");
                        ContactInfo::default()
                    }
                };
                ProspectContacts {
                    url: url.clone(),
                    info,
                }
            })
            .buffered(self.max_concurrent_urls)
            .collect()
            .await
    }

    /// Ends a queued run that cannot execute. It is started first so the
    /// only transitions are the ones a normal run takes.
    async fn abandon_run(&self, public_id: Uuid, message: &str) {
        match self.store.start_run(public_id).await {
            Ok(run) => self.fail_run_best_effort(&run, message).await,
            Err(err) => tracing::warn!(
                run_id = %public_id,
                error = %format!("{err:#}"),
                "could not open queued run to mark it failed"
            ),
        }
    }

    async fn fail_run_best_effort(&self, run: &RunHandle, message: &str) {
        if let Err(mark_err) = self.store.fail_run(run, message).await {
            tracing::error!(
                run_id = %run.public_id,
                error = %format!("{mark_err:#}"),
                "failed to mark workflow run as failed"
            );
        }
    }
}

/// Exact-match de-duplication, first occurrence wins, then truncation.
fn dedupe_urls(urls: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .take(limit)
        .collect()
}
