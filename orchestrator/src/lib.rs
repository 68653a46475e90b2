pub mod configs;
pub mod error;
pub mod report;
pub mod search;

use machine_learning::{batches::BatchGenerator, dataset::Dataset};

use configs::{Adapter, SearchConfig};

pub use error::{OrchestratorError, Stage};
pub use report::{Report, TrialSummary};
pub use search::{GridSearch, Hyperparams, Outcome, Trial};

/// Runs the grid search described by `config`.
///
/// # Errors
/// Returns an `OrchestratorError` if the config is invalid or any stage of the search
/// fails.
pub fn search(config: &SearchConfig) -> Result<Outcome, OrchestratorError> {
    log::info!("validating config");
    config.validate()?;

    let adapter = Adapter::new();
    let op = adapter.adapt_ops(&config.ops);
    let train = adapter.adapt_dataset(&config.train)?;
    let validation = adapter.adapt_dataset(&config.validation)?;
    let test = adapter.adapt_dataset(&config.test)?;
    log::info!(
        "loaded {} train, {} validation and {} test samples",
        train.len(),
        validation.len(),
        test.len()
    );

    let batch_size = config.batch_size.get();
    let train = BatchGenerator::new(train, batch_size, config.shuffle, op.clone())?;
    let validation = BatchGenerator::new(validation, batch_size, false, op.clone())?;
    let test = BatchGenerator::new(test, batch_size, false, op)?;

    adapter.adapt_search(config)?.run(&train, &validation, &test)
}

/// Runs the grid search described by `config` and summarizes it.
pub fn run(config: &SearchConfig) -> Result<Report, OrchestratorError> {
    search(config).map(|outcome| Report::from(&outcome))
}
