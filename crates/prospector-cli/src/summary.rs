use prospector_pipeline::RunReport;
use prospector_scoring::SiteAnalysis;

fn contact_count(report: &RunReport) -> usize {
    report
        .contacts
        .iter()
        .map(|c| {
            c.info.emails.len()
                + c.info.phones.len()
                + c.info.social_links.len()
                + usize::from(c.info.contact_page_url.is_some())
        })
        .sum()
}

fn score_row(analysis: &SiteAnalysis) -> String {
    let s = &analysis.scores;
    format!(
        "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
        analysis.url,
        analysis.overall_score,
        s.mobile_responsiveness,
        s.performance,
        s.seo,
        s.security,
        s.outdated
    )
}

/// Human-readable run summary printed by `prospector run`.
pub(crate) fn render_summary(report: &RunReport) -> String {
    let mut lines = vec![
        format!("Workflow run {} completed", report.run_id),
        format!(
            "Audience: {} | Location: {}",
            report.audience, report.location
        ),
        format!(
            "Prospects: {} | Analyses: {} | Contacts: {}",
            report.prospects.len(),
            report.analyses.len(),
            contact_count(report)
        ),
    ];

    if !report.analyses.is_empty() {
        lines.push(String::new());
        lines.push("| URL | Overall | Mobile | Performance | SEO | Security | Outdated |".to_owned());
        lines.push("|-----|---------|--------|-------------|-----|----------|----------|".to_owned());
        lines.extend(report.analyses.iter().map(score_row));
    }

    for analysis in &report.analyses {
        let suggestions = analysis.improvement_suggestions();
        if suggestions.is_empty() && analysis.technical_issues.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{}:", analysis.url));
        lines.extend(suggestions.iter().map(|s| format!("  - {s}")));
        lines.extend(
            analysis
                .technical_issues
                .iter()
                .map(|issue| format!("  ! {issue}")),
        );
    }

    let timings: Vec<String> = report
        .timings
        .iter()
        .map(|t| format!("{} {}ms", t.step, t.duration_ms()))
        .collect();
    lines.push(String::new());
    lines.push(format!("Steps: {}", timings.join(", ")));

    lines.join("\n")
}
