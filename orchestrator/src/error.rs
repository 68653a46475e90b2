use std::fmt;

use machine_learning::MlErr;

/// The stage of the grid search an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sweep,
    Selection,
    FinalScoring,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sweep => "sweep",
            Self::Selection => "selection",
            Self::FinalScoring => "final scoring",
        };

        f.write_str(s)
    }
}

/// All errors that can occur in the orchestrator.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Invalid configuration, caught before any training.
    InvalidConfig(String),
    /// Training or scoring one hyperparameter combination failed.
    Trial {
        stage: Stage,
        learning_rate: f32,
        momentum: f32,
        source: MlErr,
    },
    /// A stage failed before or after touching any single combination.
    Stage { stage: Stage, source: MlErr },
    /// A failure outside the search itself, e.g. building a dataset.
    Ml(MlErr),
    /// Reading a config or writing a report failed.
    Io(std::io::Error),
    /// A config or report could not be (de)serialized.
    Json(serde_json::Error),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Trial {
                stage,
                learning_rate,
                momentum,
                source,
            } => write!(
                f,
                "{stage} failed for lr={learning_rate}, momentum={momentum}: {source}"
            ),
            Self::Stage { stage, source } => write!(f, "{stage} failed: {source}"),
            Self::Ml(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Trial { source, .. } | Self::Stage { source, .. } => Some(source),
            Self::Ml(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<MlErr> for OrchestratorError {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<std::io::Error> for OrchestratorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_errors_name_stage_and_combination() {
        let err = OrchestratorError::Trial {
            stage: Stage::Sweep,
            learning_rate: 0.1,
            momentum: 0.5,
            source: MlErr::ShapeMismatch {
                what: "features",
                got: 3,
                expected: 4,
            },
        };

        assert_eq!(
            err.to_string(),
            "sweep failed for lr=0.1, momentum=0.5: shape mismatch for features: got 3, expected 4"
        );
    }

    #[test]
    fn stage_errors_name_the_stage() {
        let err = OrchestratorError::Stage {
            stage: Stage::Selection,
            source: MlErr::InvalidConfig("no trials".into()),
        };

        assert_eq!(
            err.to_string(),
            "selection failed: invalid configuration: no trials"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
