use thiserror::Error;

/// Stage of a website-prospector run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Search,
    Score,
    Contacts,
    Persist,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Search => "search",
            Step::Score => "score",
            Step::Contacts => "contacts",
            Step::Persist => "persist",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Raised before any step runs.
    #[error("unknown audience: {0}")]
    UnknownAudience(String),

    /// The run row could not be created or moved to `running`.
    #[error("could not open workflow run")]
    Run(#[source] anyhow::Error),

    #[error("{step} step failed")]
    StepFailure {
        step: Step,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            PipelineError::StepFailure { step, .. } => Some(*step),
            PipelineError::UnknownAudience(_) | PipelineError::Run(_) => None,
        }
    }

    /// This error and its causes joined with `": "`, as stored on a failed run.
    #[must_use]
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detailed_message_includes_cause_chain() {
        let source = anyhow::anyhow!("connection reset").context("insert prospects");
        let err = PipelineError::StepFailure {
            step: Step::Persist,
            source,
        };
        assert_eq!(err.to_string(), "persist step failed");
        assert_eq!(
            err.detailed_message(),
            "persist step failed: insert prospects: connection reset"
        );
        assert_eq!(err.step(), Some(Step::Persist));
    }

    #[test]
    fn unknown_audience_has_no_step() {
        let err = PipelineError::UnknownAudience("dentists".to_owned());
        assert_eq!(err.step(), None);
        assert_eq!(err.detailed_message(), "unknown audience: dentists");
    }
}
