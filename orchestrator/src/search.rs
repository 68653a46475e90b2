use std::{
    fmt,
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use machine_learning::{
    MlErr,
    batches::BatchGenerator,
    dataset::Dataset,
    metrics::Accuracy,
    model::LinearClassifier,
};
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Stage};

/// One point of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    pub learning_rate: f32,
    pub momentum: f32,
}

impl fmt::Display for Hyperparams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lr={}, momentum={}", self.learning_rate, self.momentum)
    }
}

/// A trained classifier together with its validation accuracy.
#[derive(Debug, Clone)]
pub struct Trial {
    pub hyperparams: Hyperparams,
    pub classifier: LinearClassifier,
    pub accuracy: Accuracy,
    /// Fewer than the configured epochs if the trial was cut short.
    pub epochs_run: usize,
}

/// The result of a full grid search.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Every trial, in sweep order.
    pub trials: Vec<Trial>,
    /// Index of the selected trial.
    pub best: usize,
    pub test_accuracy: Accuracy,
}

impl Outcome {
    pub fn best(&self) -> &Trial {
        &self.trials[self.best]
    }
}

/// Exhaustive search over learning rate and momentum.
///
/// Every combination gets a freshly initialized classifier, trained for a fixed amount of
/// epochs and scored on the validation partition. The most accurate one is then scored on
/// the test partition.
#[derive(Debug, Clone)]
pub struct GridSearch {
    learning_rates: Vec<f32>,
    momenta: Vec<f32>,
    epochs: NonZeroUsize,
    nesterov: bool,
    seed: Option<u64>,
    workers: Option<NonZeroUsize>,
    max_trial_time: Option<Duration>,
}

impl GridSearch {
    /// Creates a new `GridSearch`.
    ///
    /// # Arguments
    /// * `learning_rates` - The learning rates to try.
    /// * `momenta` - The momenta to try with each learning rate.
    /// * `epochs` - The amount of passes over the training set per trial.
    ///
    /// # Errors
    /// `OrchestratorError::InvalidConfig` if either option set is empty.
    pub fn new(
        learning_rates: Vec<f32>,
        momenta: Vec<f32>,
        epochs: NonZeroUsize,
    ) -> Result<Self, OrchestratorError> {
        if learning_rates.is_empty() || momenta.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "the grid needs at least one learning rate and one momentum".into(),
            ));
        }

        Ok(Self {
            learning_rates,
            momenta,
            epochs,
            nesterov: false,
            seed: None,
            workers: None,
            max_trial_time: None,
        })
    }

    pub fn with_nesterov(mut self, nesterov: bool) -> Self {
        self.nesterov = nesterov;
        self
    }

    /// Seeds the initial weights and the shuffling of every trial. All trials start from
    /// the same weights.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Trains up to `workers` trials at once.
    pub fn with_workers(mut self, workers: Option<NonZeroUsize>) -> Self {
        self.workers = workers;
        self
    }

    /// Stops training a trial once it has run for `max` and finishes the current epoch.
    pub fn with_max_trial_time(mut self, max: Option<Duration>) -> Self {
        self.max_trial_time = max;
        self
    }

    /// Every combination of the grid, learning rates in the outer loop.
    pub fn combinations(&self) -> Vec<Hyperparams> {
        self.learning_rates
            .iter()
            .flat_map(|&learning_rate| {
                self.momenta.iter().map(move |&momentum| Hyperparams {
                    learning_rate,
                    momentum,
                })
            })
            .collect()
    }

    /// Runs the sweep, selects the best trial and scores it on the test partition.
    ///
    /// # Errors
    /// The first failure of any stage, tagged with the stage and combination it happened
    /// in.
    pub fn run<D: Dataset>(
        &self,
        train: &BatchGenerator<D>,
        validation: &BatchGenerator<D>,
        test: &BatchGenerator<D>,
    ) -> Result<Outcome, OrchestratorError> {
        let trials = self.sweep(train, validation)?;

        let best = select_best(&trials)?;
        let winner = &trials[best];
        info!(
            "selected {} with validation {}",
            winner.hyperparams, winner.accuracy
        );

        let test_accuracy = score(&winner.classifier, test)
            .map_err(|e| trial_err(Stage::FinalScoring, winner.hyperparams, e))?;
        info!("test {test_accuracy}");

        Ok(Outcome {
            trials,
            best,
            test_accuracy,
        })
    }

    /// Trains and validates one classifier per combination.
    ///
    /// Trial `i` initializes its weights from the search seed and shuffles its training
    /// passes with its own generator seeded from the search seed plus `i`, so a trial
    /// trains the same way whichever worker runs it.
    ///
    /// # Returns
    /// The trials in sweep order, regardless of how many workers ran them.
    pub fn sweep<D: Dataset>(
        &self,
        train: &BatchGenerator<D>,
        validation: &BatchGenerator<D>,
    ) -> Result<Vec<Trial>, OrchestratorError> {
        let input_dim = train
            .feature_dim()
            .map_err(|source| OrchestratorError::Stage {
                stage: Stage::Sweep,
                source,
            })?;
        let num_classes = train.dataset().num_classes();
        let seed = self.seed.unwrap_or_else(rand::random);
        let combinations = self.combinations();

        info!(
            trials = combinations.len(), epochs = self.epochs.get(), input_dim, num_classes;
            "starting grid search"
        );

        let run_trial = |(index, &hyperparams): (usize, &Hyperparams)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
            self.trial(hyperparams, input_dim, num_classes, seed, &mut rng, train, validation)
                .map_err(|e| trial_err(Stage::Sweep, hyperparams, e))
        };

        match self.workers.map(NonZeroUsize::get) {
            Some(workers) if workers > 1 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| OrchestratorError::InvalidConfig(e.to_string()))?;

                pool.install(|| combinations.par_iter().enumerate().map(run_trial).collect())
            }
            _ => combinations.iter().enumerate().map(run_trial).collect(),
        }
    }

    fn trial<D: Dataset>(
        &self,
        hyperparams: Hyperparams,
        input_dim: usize,
        num_classes: usize,
        seed: u64,
        rng: &mut StdRng,
        train: &BatchGenerator<D>,
        validation: &BatchGenerator<D>,
    ) -> Result<Trial, MlErr> {
        let Hyperparams {
            learning_rate,
            momentum,
        } = hyperparams;

        let start = Instant::now();
        let mut classifier = LinearClassifier::seeded(
            input_dim,
            num_classes,
            learning_rate,
            momentum,
            self.nesterov,
            seed,
        )?;

        let mut epochs_run = 0;
        while epochs_run < self.epochs.get() {
            let mut total_loss = 0.;
            let mut batches = 0;

            for batch in train.iter_with(rng) {
                let batch = batch?;
                total_loss += classifier.train(batch.data.view(), batch.labels.view())?;
                batches += 1;
            }

            epochs_run += 1;
            let loss = total_loss / batches.max(1) as f32;
            debug!(
                lr = learning_rate, momentum, epoch = epochs_run, loss;
                "finished epoch"
            );

            if !loss.is_finite() {
                warn!("{hyperparams} diverged at epoch {epochs_run}, stopping the trial");
                break;
            }

            if let Some(max) = self.max_trial_time {
                if start.elapsed() >= max && epochs_run < self.epochs.get() {
                    warn!(
                        "{hyperparams} reached the time limit after {epochs_run} of {} epochs",
                        self.epochs
                    );
                    break;
                }
            }
        }

        let accuracy = score(&classifier, validation)?;
        info!(
            lr = learning_rate, momentum, accuracy = accuracy.accuracy(), epochs = epochs_run;
            "trial finished"
        );

        Ok(Trial {
            hyperparams,
            classifier,
            accuracy,
            epochs_run,
        })
    }
}

/// Picks the most accurate trial.
///
/// Trials are scanned in order and only a strictly better one replaces the current best,
/// so among equally accurate trials the earliest wins.
///
/// # Returns
/// The index of the best trial, `None` if there are no trials.
pub fn select(trials: &[Trial]) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (i, trial) in trials.iter().enumerate() {
        match best {
            Some(b) if !trial.accuracy.is_better_than(&trials[b].accuracy) => {}
            _ => best = Some(i),
        }
    }

    best
}

fn select_best(trials: &[Trial]) -> Result<usize, OrchestratorError> {
    select(trials).ok_or_else(|| OrchestratorError::Stage {
        stage: Stage::Selection,
        source: MlErr::InvalidConfig("the sweep produced no trials".into()),
    })
}

/// Accumulates the accuracy of `classifier` over one pass of `batches`.
pub fn score<D: Dataset>(
    classifier: &LinearClassifier,
    batches: &BatchGenerator<D>,
) -> Result<Accuracy, MlErr> {
    let mut accuracy = Accuracy::new();

    for batch in batches {
        let batch = batch?;
        let predicted = classifier.predict(batch.data.view())?;
        accuracy.update(predicted.view(), batch.labels.view())?;
    }

    Ok(accuracy)
}

fn trial_err(stage: Stage, hyperparams: Hyperparams, source: MlErr) -> OrchestratorError {
    OrchestratorError::Trial {
        stage,
        learning_rate: hyperparams.learning_rate,
        momentum: hyperparams.momentum,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(learning_rate: f32, correct: usize) -> Trial {
        let mut accuracy = Accuracy::new();
        let predicted = ndarray::Array1::from_elem(10, 0);
        let truth = ndarray::Array1::from_shape_fn(10, |i| (i >= correct) as usize);
        accuracy.update(predicted.view(), truth.view()).unwrap();

        Trial {
            hyperparams: Hyperparams {
                learning_rate,
                momentum: 0.,
            },
            classifier: LinearClassifier::new(1, 2, learning_rate, 0., false).unwrap(),
            accuracy,
            epochs_run: 1,
        }
    }

    #[test]
    fn combinations_follow_sweep_order() {
        let search = GridSearch::new(
            vec![0.1, 0.01],
            vec![0., 0.5, 0.9],
            NonZeroUsize::MIN,
        )
        .unwrap();

        let combinations: Vec<_> = search
            .combinations()
            .iter()
            .map(|h| (h.learning_rate, h.momentum))
            .collect();

        assert_eq!(
            combinations,
            [
                (0.1, 0.),
                (0.1, 0.5),
                (0.1, 0.9),
                (0.01, 0.),
                (0.01, 0.5),
                (0.01, 0.9)
            ]
        );
    }

    #[test]
    fn empty_grids_are_rejected() {
        assert!(GridSearch::new(vec![], vec![0.], NonZeroUsize::MIN).is_err());
        assert!(GridSearch::new(vec![0.1], vec![], NonZeroUsize::MIN).is_err());
    }

    #[test]
    fn selection_prefers_higher_accuracy() {
        let trials = [trial(0.1, 5), trial(0.2, 9), trial(0.3, 7)];
        assert_eq!(select(&trials), Some(1));
    }

    #[test]
    fn selection_ties_keep_the_first_trial() {
        let trials = [trial(0.1, 3), trial(0.2, 8), trial(0.3, 8), trial(0.4, 8)];
        assert_eq!(select(&trials), Some(1));
    }

    #[test]
    fn selection_of_nothing() {
        assert_eq!(select(&[]), None);
        assert_eq!(select(&[trial(0.1, 0)]), Some(0));
    }

    #[test]
    fn empty_sweeps_fail_in_selection() {
        match select_best(&[]) {
            Err(OrchestratorError::Stage {
                stage: Stage::Selection,
                ..
            }) => {}
            other => panic!("expected a selection error, got {other:?}"),
        }

        assert_eq!(select_best(&[trial(0.1, 4), trial(0.2, 6)]).unwrap(), 1);
    }
}
