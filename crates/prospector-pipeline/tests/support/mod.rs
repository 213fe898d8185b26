//! In-memory fakes of every pipeline seam.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use prospector_core::{AudienceRegistry, ContactInfo, Prospect};
use prospector_db::DbError;
use prospector_pipeline::{
    Collaborators, ContactProvider, Job, JobQueue, ProspectContacts, ProspectStore, QueuedJob,
    RunHandle, SearchProvider, StubContacts, StubTelemetry, TelemetrySource, WebsiteProspector,
};
use prospector_scoring::{SiteAnalysis, TelemetryBundle};
use prospector_scraper::ScraperError;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredRun {
    pub handle: RunHandle,
    pub audience_name: String,
    pub location: String,
    pub max_prospects: Option<usize>,
    pub status: &'static str,
    pub error_message: Option<String>,
}

#[derive(Debug, Default)]
pub struct StoreState {
    pub runs: Vec<StoredRun>,
    pub prospects: Vec<(i64, Prospect)>,
    pub analyses: Vec<(i64, SiteAnalysis)>,
    pub contacts: Vec<(i64, ProspectContacts)>,
    next_id: i64,
    pub fail_analyses: bool,
}

impl StoreState {
    pub fn run(&self, public_id: Uuid) -> &StoredRun {
        self.runs
            .iter()
            .find(|r| r.handle.public_id == public_id)
            .expect("run exists")
    }

    pub fn only_run(&self) -> &StoredRun {
        assert_eq!(self.runs.len(), 1, "expected exactly one run");
        &self.runs[0]
    }
}

/// Mirrors the run-status guards of the Postgres queries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn failing_analyses() -> Self {
        let store = Self::default();
        store.state().fail_analyses = true;
        store
    }

    fn transition(
        &self,
        public_id: Uuid,
        from: &[&'static str],
        to: &'static str,
        message: Option<&str>,
    ) -> Result<RunHandle, DbError> {
        let mut state = self.state();
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.handle.public_id == public_id)
            .ok_or(DbError::NotFound)?;
        if !from.contains(&run.status) {
            return Err(DbError::InvalidRunTransition {
                public_id,
                target: to,
                expected: from[0],
            });
        }
        run.status = to;
        if let Some(message) = message {
            run.error_message = Some(message.to_owned());
        }
        Ok(run.handle)
    }
}

#[async_trait]
impl ProspectStore for MemoryStore {
    async fn create_run(
        &self,
        audience_name: &str,
        location: &str,
        max_prospects: Option<usize>,
    ) -> anyhow::Result<RunHandle> {
        let mut state = self.state();
        state.next_id += 1;
        let handle = RunHandle {
            id: state.next_id,
            public_id: Uuid::new_v4(),
        };
        state.runs.push(StoredRun {
            handle,
            audience_name: audience_name.to_owned(),
            location: location.to_owned(),
            max_prospects,
            status: "pending",
            error_message: None,
        });
        Ok(handle)
    }

    async fn start_run(&self, public_id: Uuid) -> anyhow::Result<RunHandle> {
        Ok(self.transition(public_id, &["pending"], "running", None)?)
    }

    async fn complete_run(&self, run: &RunHandle) -> anyhow::Result<()> {
        self.transition(run.public_id, &["running"], "completed", None)?;
        Ok(())
    }

    async fn fail_run(&self, run: &RunHandle, message: &str) -> anyhow::Result<()> {
        self.transition(run.public_id, &["pending", "running"], "failed", Some(message))?;
        Ok(())
    }

    async fn insert_prospects(
        &self,
        run: &RunHandle,
        prospects: &[Prospect],
    ) -> anyhow::Result<u64> {
        let mut state = self.state();
        let mut inserted = 0;
        for prospect in prospects {
            let exists = state
                .prospects
                .iter()
                .any(|(id, p)| *id == run.id && p.url == prospect.url);
            if !exists {
                state.prospects.push((run.id, prospect.clone()));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn insert_analyses(
        &self,
        run: &RunHandle,
        analyses: &[SiteAnalysis],
    ) -> anyhow::Result<u64> {
        let mut state = self.state();
        if state.fail_analyses {
            anyhow::bail!("connection reset");
        }
        let mut stored = 0;
        for analysis in analyses {
            let known = state
                .prospects
                .iter()
                .any(|(id, p)| *id == run.id && p.url == analysis.url);
            if known {
                state.analyses.push((run.id, analysis.clone()));
                stored += 1;
            }
        }
        Ok(stored)
    }

    async fn insert_contacts(
        &self,
        run: &RunHandle,
        contacts: &[ProspectContacts],
    ) -> anyhow::Result<u64> {
        let mut state = self.state();
        for entry in contacts {
            state.contacts.push((run.id, entry.clone()));
        }
        Ok(contacts.len() as u64)
    }
}

/// Returns its fixed list verbatim, duplicates included.
pub struct FixedSearch(pub Vec<String>);

impl FixedSearch {
    pub fn of(urls: &[&str]) -> Self {
        Self(urls.iter().map(|u| (*u).to_owned()).collect())
    }
}

#[async_trait]
impl SearchProvider for FixedSearch {
    async fn discover(&self, _queries: &[String], _limit: usize) -> anyhow::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

pub struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn discover(&self, _queries: &[String], _limit: usize) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("search backend unavailable")
    }
}

/// Stub telemetry, except for URLs listed as broken. `delays` slows
/// individual URLs down.
#[derive(Default)]
pub struct FlakyTelemetry {
    pub broken: HashSet<String>,
    pub delays: HashMap<String, Duration>,
}

impl FlakyTelemetry {
    pub fn broken(urls: &[&str]) -> Self {
        Self {
            broken: urls.iter().map(|u| (*u).to_owned()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl TelemetrySource for FlakyTelemetry {
    async fn render(&self, url: &str) -> Result<TelemetryBundle, ScraperError> {
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if self.broken.contains(url) {
            return Err(ScraperError::RenderFailure {
                url: url.to_owned(),
                reason: "navigation timeout".to_owned(),
            });
        }
        Ok(StubTelemetry::bundle_for(url))
    }
}

pub struct FailingContacts;

#[async_trait]
impl ContactProvider for FailingContacts {
    async fn extract(&self, _url: &str) -> anyhow::Result<ContactInfo> {
        anyhow::bail!("page would not load")
    }
}

/// Returns more emails than the cap allows, with duplicates.
pub struct NoisyContacts;

#[async_trait]
impl ContactProvider for NoisyContacts {
    async fn extract(&self, _url: &str) -> anyhow::Result<ContactInfo> {
        Ok(ContactInfo {
            emails: (0..8).map(|i| format!("team{}@site.com", i % 7)).collect(),
            phones: vec!["(555) 010-0000".to_owned(); 4],
            ..ContactInfo::default()
        })
    }
}

pub fn collaborators(
    search: impl SearchProvider + 'static,
    telemetry: impl TelemetrySource + 'static,
) -> Collaborators {
    Collaborators {
        telemetry: Arc::new(telemetry),
        search: Arc::new(search),
        contacts: Arc::new(StubContacts),
    }
}

pub fn prospector(collaborators: Collaborators, store: &MemoryStore) -> WebsiteProspector {
    let registry = AudienceRegistry::builtin().expect("builtin registry");
    WebsiteProspector::new(registry, collaborators, Arc::new(store.clone()))
}

#[derive(Debug, Default)]
pub struct QueueState {
    pub pending: VecDeque<QueuedJob>,
    pub acked: Vec<i64>,
    next_id: i64,
}

/// Receiving pops the message, as if its visibility timeout never lapses.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    state: Arc<Mutex<QueueState>>,
}

impl MemoryQueue {
    pub fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap()
    }

    pub fn push_raw(&self, payload: serde_json::Value) -> i64 {
        let mut state = self.state();
        state.next_id += 1;
        let msg_id = state.next_id;
        state.pending.push_back(QueuedJob {
            msg_id,
            read_count: 1,
            payload,
        });
        msg_id
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn receive(&self, _visibility_timeout_secs: i32) -> anyhow::Result<Option<QueuedJob>> {
        Ok(self.state().pending.pop_front())
    }

    async fn ack(&self, msg_id: i64) -> anyhow::Result<bool> {
        self.state().acked.push(msg_id);
        Ok(true)
    }

    async fn enqueue(&self, job: &Job) -> anyhow::Result<i64> {
        Ok(self.push_raw(serde_json::to_value(job)?))
    }
}
