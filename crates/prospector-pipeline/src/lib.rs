//! Website-prospector workflow: collaborator seams, the orchestrated run and
//! the queue worker.

pub mod error;
pub mod providers;
pub mod queue;
mod steps;
pub mod store;
pub mod worker;
pub mod workflow;

pub use error::{PipelineError, Step};
pub use providers::{
    ContactProvider, SearchProvider, StubContacts, StubSearch, StubTelemetry, TelemetrySource,
    STUB_URLS,
};
pub use queue::{Job, JobDefaults, JobQueue, QueuedJob};
pub use steps::StepTiming;
pub use store::{ProspectContacts, ProspectStore, RunHandle};
pub use worker::{enqueue_job, EnqueuedJob, JobOutcome, Worker};
pub use workflow::{
    Collaborators, RunReport, RunRequest, RunTarget, WebsiteProspector, WORKFLOW_NAME,
};
