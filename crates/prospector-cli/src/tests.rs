use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use prospector_core::{ContactInfo, Prospect};
use prospector_pipeline::{ProspectContacts, RunReport, Step, StepTiming};
use prospector_scoring::{SiteAnalysis, SubScores};

use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["prospector", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Ping
        }
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["prospector", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Migrate
        }
    ));
}

#[test]
fn run_defaults_leave_options_unset() {
    let cli = Cli::try_parse_from(["prospector", "run", "website_prospector"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Run {
            workflow: Workflow::WebsiteProspector,
            audience: None,
            location: None,
            max: None,
            offline: false,
        }
    ));
}

#[test]
fn run_with_all_options() {
    let cli = Cli::try_parse_from([
        "prospector",
        "run",
        "website_prospector",
        "--audience",
        "saas",
        "--location",
        "Berlin",
        "--max",
        "7",
        "--offline",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Run {
            audience: Some(ref a),
            location: Some(ref l),
            max: Some(7),
            offline: true,
            ..
        } if a == "saas" && l == "Berlin"
    ));
}

#[test]
fn run_rejects_unknown_workflow() {
    assert!(Cli::try_parse_from(["prospector", "run", "lead_scorer"]).is_err());
}

#[test]
fn run_rejects_zero_max() {
    assert!(
        Cli::try_parse_from(["prospector", "run", "website_prospector", "--max", "0"]).is_err()
    );
}

#[test]
fn parses_worker_offline() {
    let cli = Cli::try_parse_from(["prospector", "worker", "--offline"]).unwrap();
    assert!(matches!(cli.command, Commands::Worker { offline: true }));
}

#[test]
fn parses_enqueue() {
    let cli = Cli::try_parse_from(["prospector", "enqueue", "--audience", "ecommerce", "--max", "3"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Enqueue {
            audience: Some(ref a),
            location: None,
            max: Some(3),
        } if a == "ecommerce"
    ));
}

#[test]
fn runs_limit_defaults_to_twenty() {
    let cli = Cli::try_parse_from(["prospector", "runs"]).unwrap();
    assert!(matches!(cli.command, Commands::Runs { limit: 20 }));
}

#[test]
fn runs_limit_must_be_positive() {
    assert!(Cli::try_parse_from(["prospector", "runs", "--limit=-1"]).is_err());
    assert!(Cli::try_parse_from(["prospector", "runs", "--limit", "0"]).is_err());
    let cli = Cli::try_parse_from(["prospector", "runs", "--limit", "5"]).unwrap();
    assert!(matches!(cli.command, Commands::Runs { limit: 5 }));
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["prospector"]).is_err());
}

fn test_config() -> AppConfig {
    prospector_core::build_app_config(|key| match key {
        "DATABASE_URL" => Ok("postgres://localhost/prospector".to_owned()),
        "DEFAULT_LOCATION" => Ok("Leeds".to_owned()),
        _ => Err(std::env::VarError::NotPresent),
    })
    .unwrap()
}

#[test]
fn run_request_falls_back_to_config_defaults() {
    let config = test_config();
    let request = commands::run_request(&config, None, None, None);
    assert_eq!(request.audience_name, "local_business");
    assert_eq!(request.location, "Leeds");
    assert_eq!(request.max_prospects, 5);

    let request = commands::run_request(&config, Some("saas".to_owned()), None, Some(9));
    assert_eq!(request.audience_name, "saas");
    assert_eq!(request.max_prospects, 9);
}

fn sample_report() -> RunReport {
    let weak = SiteAnalysis {
        url: "https://acme.com".to_owned(),
        scores: SubScores {
            mobile_responsiveness: 0.4,
            performance: 0.9,
            seo: 0.8,
            security: 1.0,
            outdated: 0.1,
        },
        overall_score: 0.6,
        improvement_areas: Vec::new(),
        technical_issues: vec!["Missing meta description".to_owned()],
        analyzed_at: Utc::now(),
    };
    RunReport {
        run_id: uuid::Uuid::nil(),
        audience: "local_business".to_owned(),
        location: "Austin".to_owned(),
        prospects: vec![Prospect::discovered("https://acme.com", None, None)],
        analyses: vec![weak],
        contacts: vec![ProspectContacts {
            url: "https://acme.com".to_owned(),
            info: ContactInfo {
                emails: vec!["info@acme.com".to_owned()],
                phones: vec!["(512) 555-0100".to_owned()],
                contact_page_url: Some("https://acme.com/contact".to_owned()),
                social_links: Vec::new(),
            },
        }],
        timings: vec![StepTiming {
            step: Step::Search,
            duration: Duration::from_millis(42),
        }],
    }
}

#[test]
fn summary_lists_counts_scores_and_suggestions() {
    let text = summary::render_summary(&sample_report());
    assert!(text.starts_with("Workflow run 00000000-0000-0000-0000-000000000000 completed"));
    assert!(text.contains("Prospects: 1 | Analyses: 1 | Contacts: 3"));
    assert!(text.contains("| https://acme.com | 0.60 | 0.40 | 0.90 | 0.80 | 1.00 | 0.10 |"));
    assert!(text.contains("  - Implement responsive design for mobile devices"));
    assert!(text.contains("  ! Missing meta description"));
    assert!(text.ends_with("Steps: search 42ms"));
}
