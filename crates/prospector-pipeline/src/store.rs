//! Persistence seam of the workflow and its Postgres implementation.

use anyhow::Context;
use async_trait::async_trait;
use prospector_core::{ContactInfo, Prospect};
use prospector_db::PgStore;
use prospector_scoring::SiteAnalysis;
use uuid::Uuid;

/// Identifiers of one workflow run row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHandle {
    pub id: i64,
    pub public_id: Uuid,
}

impl From<&prospector_db::WorkflowRunRow> for RunHandle {
    fn from(row: &prospector_db::WorkflowRunRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
        }
    }
}

/// Contact details gathered for one prospect URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ProspectContacts {
    pub url: String,
    pub info: ContactInfo,
}

#[async_trait]
pub trait ProspectStore: Send + Sync {
    /// Creates a `pending` run.
    async fn create_run(
        &self,
        audience_name: &str,
        location: &str,
        max_prospects: Option<usize>,
    ) -> anyhow::Result<RunHandle>;

    /// Moves a pending run to `running`.
    async fn start_run(&self, public_id: Uuid) -> anyhow::Result<RunHandle>;

    async fn complete_run(&self, run: &RunHandle) -> anyhow::Result<()>;

    async fn fail_run(&self, run: &RunHandle, message: &str) -> anyhow::Result<()>;

    /// Returns the number of newly inserted prospects.
    async fn insert_prospects(&self, run: &RunHandle, prospects: &[Prospect])
        -> anyhow::Result<u64>;

    /// Stores analyses for prospects of `run`; analyses whose URL has no
    /// prospect are skipped. Returns the number stored.
    async fn insert_analyses(
        &self,
        run: &RunHandle,
        analyses: &[SiteAnalysis],
    ) -> anyhow::Result<u64>;

    /// Returns the number of contact rows stored.
    async fn insert_contacts(
        &self,
        run: &RunHandle,
        contacts: &[ProspectContacts],
    ) -> anyhow::Result<u64>;
}

#[async_trait]
impl ProspectStore for PgStore {
    async fn create_run(
        &self,
        audience_name: &str,
        location: &str,
        max_prospects: Option<usize>,
    ) -> anyhow::Result<RunHandle> {
        let max_prospects = max_prospects
            .map(i32::try_from)
            .transpose()
            .context("max_prospects does not fit the run table")?;
        let row =
            prospector_db::create_workflow_run(self.pool(), audience_name, location, max_prospects)
                .await?;
        Ok(RunHandle::from(&row))
    }

    async fn start_run(&self, public_id: Uuid) -> anyhow::Result<RunHandle> {
        let row = prospector_db::start_workflow_run(self.pool(), public_id).await?;
        Ok(RunHandle::from(&row))
    }

    async fn complete_run(&self, run: &RunHandle) -> anyhow::Result<()> {
        prospector_db::complete_workflow_run(self.pool(), run.public_id).await?;
        Ok(())
    }

    async fn fail_run(&self, run: &RunHandle, message: &str) -> anyhow::Result<()> {
        prospector_db::fail_workflow_run(self.pool(), run.public_id, message).await?;
        Ok(())
    }

    async fn insert_prospects(
        &self,
        run: &RunHandle,
        prospects: &[Prospect],
    ) -> anyhow::Result<u64> {
        Ok(prospector_db::insert_prospects(self.pool(), run.id, prospects).await?)
    }

    async fn insert_analyses(
        &self,
        run: &RunHandle,
        analyses: &[SiteAnalysis],
    ) -> anyhow::Result<u64> {
        let mut stored = 0;
        for analysis in analyses {
            let inserted = prospector_db::insert_site_analysis(self.pool(), run.id, analysis)
                .await
                .with_context(|| format!("store analysis for {}", analysis.url))?;
            if inserted {
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
        let mut stored = 0;
        for entry in contacts {
            stored += prospector_db::insert_contacts(self.pool(), run.id, &entry.url, &entry.info)
                .await
                .with_context(|| format!("store contacts for {}", entry.url))?;
        }
        Ok(stored)
    }
}
