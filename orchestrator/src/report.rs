use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::OrchestratorError,
    search::{Hyperparams, Outcome},
};

/// One point of the swept accuracy surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    pub learning_rate: f32,
    pub momentum: f32,
    pub validation_accuracy: f64,
    pub epochs_run: usize,
}

/// The result of a grid search, detached from the trained classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub best: Hyperparams,
    pub validation_accuracy: f64,
    pub test_accuracy: f64,
    /// Every trial in sweep order.
    pub trials: Vec<TrialSummary>,
}

impl Report {
    pub fn to_json(&self) -> Result<String, OrchestratorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the report as JSON to `path`, replacing any existing file.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), OrchestratorError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl From<&Outcome> for Report {
    fn from(outcome: &Outcome) -> Self {
        let best = outcome.best();

        let trials = outcome
            .trials
            .iter()
            .map(|trial| TrialSummary {
                learning_rate: trial.hyperparams.learning_rate,
                momentum: trial.hyperparams.momentum,
                validation_accuracy: trial.accuracy.accuracy(),
                epochs_run: trial.epochs_run,
            })
            .collect();

        Self {
            best: best.hyperparams,
            validation_accuracy: best.accuracy.accuracy(),
            test_accuracy: outcome.test_accuracy.accuracy(),
            trials,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>10} {:>10} {:>7}", "lr", "momentum", "accuracy", "epochs")?;
        for trial in &self.trials {
            writeln!(
                f,
                "{:>12} {:>10} {:>10.4} {:>7}",
                trial.learning_rate, trial.momentum, trial.validation_accuracy, trial.epochs_run
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Best model: {}", self.best)?;
        writeln!(f, "Validation accuracy = {:.4}", self.validation_accuracy)?;
        write!(f, "Test accuracy = {:.4}", self.test_accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report {
            best: Hyperparams {
                learning_rate: 0.01,
                momentum: 0.9,
            },
            validation_accuracy: 0.75,
            test_accuracy: 0.5,
            trials: vec![
                TrialSummary {
                    learning_rate: 0.1,
                    momentum: 0.,
                    validation_accuracy: 0.5,
                    epochs_run: 10,
                },
                TrialSummary {
                    learning_rate: 0.01,
                    momentum: 0.9,
                    validation_accuracy: 0.75,
                    epochs_run: 10,
                },
            ],
        }
    }

    #[test]
    fn display_names_the_winner() {
        let s = report().to_string();

        assert!(s.contains("Best model: lr=0.01, momentum=0.9"));
        assert!(s.contains("Test accuracy = 0.5000"));
        assert_eq!(s.lines().count(), 2 + 1 + 1 + 3);
    }

    #[test]
    fn json_keeps_the_surface() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["trials"].as_array().unwrap().len(), 2);
        assert_eq!(value["test_accuracy"], 0.5);
        assert_eq!(serde_json::from_str::<Report>(&json).unwrap(), report());
    }
}
