mod support;

use std::sync::Arc;
use std::time::Duration;

use prospector_pipeline::{
    Collaborators, PipelineError, RunRequest, RunTarget, Step, StubTelemetry,
};
use support::{
    collaborators, prospector, FailingContacts, FailingSearch, FixedSearch, FlakyTelemetry,
    MemoryStore, NoisyContacts,
};

#[tokio::test]
async fn duplicate_search_results_yield_one_analysis_per_url() {
    let store = MemoryStore::default();
    let search = FixedSearch::of(&["https://a.com", "https://a.com", "https://b.com"]);
    let workflow = prospector(collaborators(search, StubTelemetry), &store);

    let report = workflow
        .run(&RunRequest::new("local_business", "Austin", 10))
        .await
        .unwrap();

    assert_eq!(report.analyses.len(), 2);
    assert_eq!(report.prospects.len(), 2);
    let state = store.state();
    assert_eq!(state.analyses.len(), 2);
    assert_eq!(state.prospects.len(), 2);
    assert_eq!(state.only_run().status, "completed");
}

#[tokio::test]
async fn unknown_audience_writes_nothing() {
    let store = MemoryStore::default();
    let workflow = prospector(Collaborators::offline(), &store);

    let err = workflow
        .run(&RunRequest::new("florists", "Austin", 5))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UnknownAudience(ref name) if name == "florists"));
    let state = store.state();
    assert!(state.runs.is_empty());
    assert!(state.prospects.is_empty());
}

#[tokio::test]
async fn render_failure_drops_only_that_analysis() {
    let store = MemoryStore::default();
    let search = FixedSearch::of(&["https://a.com", "https://b.com", "https://c.com"]);
    let telemetry = FlakyTelemetry::broken(&["https://b.com"]);
    let workflow = prospector(collaborators(search, telemetry), &store);

    let report = workflow
        .run(&RunRequest::new("ecommerce", "Denver", 10))
        .await
        .unwrap();

    let analysed: Vec<&str> = report.analyses.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(analysed, vec!["https://a.com", "https://c.com"]);
    assert_eq!(report.prospects.len(), 3);
    assert_eq!(report.contacts.len(), 3);
    assert_eq!(store.state().only_run().status, "completed");
}

#[tokio::test]
async fn persist_failure_marks_run_failed() {
    let store = MemoryStore::failing_analyses();
    let workflow = prospector(Collaborators::offline(), &store);

    let err = workflow
        .run(&RunRequest::new("local_business", "Austin", 3))
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(Step::Persist));
    let state = store.state();
    let run = state.only_run();
    assert_eq!(run.status, "failed");
    assert_eq!(
        run.error_message.as_deref(),
        Some("persist step failed: insert site analyses: connection reset")
    );
}

#[tokio::test]
async fn search_failure_marks_run_failed() {
    let store = MemoryStore::default();
    let workflow = prospector(collaborators(FailingSearch, StubTelemetry), &store);

    let err = workflow
        .run(&RunRequest::new("saas", "Remote", 3))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::StepFailure {
            step: Step::Search,
            ..
        }
    ));
    let state = store.state();
    assert_eq!(state.only_run().status, "failed");
    assert!(state.prospects.is_empty());
}

#[tokio::test]
async fn prospects_capped_by_request_and_audience() {
    let urls: Vec<String> = (0..30).map(|i| format!("https://site{i}.com")).collect();

    let store = MemoryStore::default();
    let workflow = prospector(
        collaborators(FixedSearch(urls.clone()), StubTelemetry),
        &store,
    );
    let report = workflow
        .run(&RunRequest::new("saas", "Remote", 100))
        .await
        .unwrap();
    assert_eq!(report.prospects.len(), 15);
    assert_eq!(report.prospects[0].url, "https://site0.com");

    let report = workflow
        .run(&RunRequest::new("saas", "Remote", 2))
        .await
        .unwrap();
    assert_eq!(report.prospects.len(), 2);
}

#[tokio::test]
async fn contact_errors_yield_empty_info() {
    let store = MemoryStore::default();
    let workflow = prospector(
        Collaborators {
            contacts: Arc::new(FailingContacts),
            ..Collaborators::offline()
        },
        &store,
    );

    let report = workflow
        .run(&RunRequest::new("local_business", "Austin", 2))
        .await
        .unwrap();

    assert_eq!(report.contacts.len(), 2);
    assert!(report.contacts.iter().all(|c| c.info.is_empty()));
    assert_eq!(store.state().only_run().status, "completed");
}

#[tokio::test]
async fn contacts_are_deduplicated_and_capped() {
    let store = MemoryStore::default();
    let workflow = prospector(
        Collaborators {
            contacts: Arc::new(NoisyContacts),
            ..Collaborators::offline()
        },
        &store,
    );

    let report = workflow
        .run(&RunRequest::new("local_business", "Austin", 1))
        .await
        .unwrap();

    let info = &report.contacts[0].info;
    assert_eq!(info.emails.len(), 5);
    assert_eq!(info.emails[0], "team0@site.com");
    assert_eq!(info.phones, vec!["(555) 010-0000"]);
}

#[tokio::test]
async fn offline_run_uses_stub_data() {
    let store = MemoryStore::default();
    let workflow = prospector(Collaborators::offline(), &store);

    let report = workflow
        .run(&RunRequest::new("local_business", "Austin", 3))
        .await
        .unwrap();

    let urls: Vec<&str> = report.prospects.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://example.com", "https://acme.com", "https://foobar.com"]
    );
    assert_eq!(report.prospects[1].business_name, "acme.com");
    assert_eq!(report.prospects[1].industry.as_deref(), Some("local_business"));
    assert_eq!(report.contacts[0].info.emails, vec!["info@example.com"]);
    assert_eq!(report.analyses.len(), 3);
    assert!(report
        .analyses
        .iter()
        .all(|a| (0.0..=1.0).contains(&a.overall_score)));
}

#[tokio::test]
async fn report_times_every_step_in_order() {
    let store = MemoryStore::default();
    let workflow = prospector(Collaborators::offline(), &store);

    let report = workflow
        .run(&RunRequest::new("ecommerce", "Austin", 2))
        .await
        .unwrap();

    let steps: Vec<Step> = report.timings.iter().map(|t| t.step).collect();
    assert_eq!(
        steps,
        vec![Step::Search, Step::Score, Step::Contacts, Step::Persist]
    );
}

#[tokio::test]
async fn concurrent_scoring_preserves_input_order() {
    let store = MemoryStore::default();
    let search = FixedSearch::of(&["https://slow.com", "https://medium.com", "https://fast.com"]);
    let mut telemetry = FlakyTelemetry::default();
    telemetry
        .delays
        .insert("https://slow.com".to_owned(), Duration::from_millis(60));
    telemetry
        .delays
        .insert("https://medium.com".to_owned(), Duration::from_millis(30));
    let workflow =
        prospector(collaborators(search, telemetry), &store).with_max_concurrent_urls(3);

    let report = workflow
        .run(&RunRequest::new("local_business", "Austin", 10))
        .await
        .unwrap();

    let analysed: Vec<&str> = report.analyses.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(
        analysed,
        vec!["https://slow.com", "https://medium.com", "https://fast.com"]
    );
}

#[tokio::test]
async fn existing_pending_run_is_started_and_completed() {
    use prospector_pipeline::ProspectStore;

    let store = MemoryStore::default();
    let pending = store
        .create_run("saas", "Remote", Some(2))
        .await
        .unwrap();
    let workflow = prospector(Collaborators::offline(), &store);

    let mut request = RunRequest::new("saas", "Remote", 2);
    request.target = RunTarget::Existing(pending.public_id);
    let report = workflow.run(&request).await.unwrap();

    assert_eq!(report.run_id, pending.public_id);
    let state = store.state();
    assert_eq!(state.only_run().status, "completed");
    assert_eq!(state.prospects.len(), 2);
}

#[tokio::test]
async fn unknown_audience_fails_existing_pending_run() {
    use prospector_pipeline::ProspectStore;

    let store = MemoryStore::default();
    let pending = store
        .create_run("florists", "Austin", Some(3))
        .await
        .unwrap();
    let workflow = prospector(Collaborators::offline(), &store);

    let mut request = RunRequest::new("florists", "Austin", 3);
    request.target = RunTarget::Existing(pending.public_id);
    let err = workflow.run(&request).await.unwrap_err();

    assert!(matches!(err, PipelineError::UnknownAudience(ref name) if name == "florists"));
    let state = store.state();
    let run = state.only_run();
    assert_eq!(run.status, "failed");
    assert_eq!(run.error_message.as_deref(), Some("unknown audience: florists"));
    assert!(state.prospects.is_empty());
}

#[tokio::test]
async fn terminal_run_cannot_be_restarted() {
    let store = MemoryStore::default();
    let workflow = prospector(Collaborators::offline(), &store);
    let report = workflow
        .run(&RunRequest::new("saas", "Remote", 1))
        .await
        .unwrap();

    let mut request = RunRequest::new("saas", "Remote", 1);
    request.target = RunTarget::Existing(report.run_id);
    let err = workflow.run(&request).await.unwrap_err();

    assert!(matches!(err, PipelineError::Run(_)));
    assert_eq!(store.state().run(report.run_id).status, "completed");
}
